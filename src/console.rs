//! Operator console: the only reader of the terminal.
//!
//! One task owns the input stream. Approval requests are answered before
//! anything else and router notices are printed between commands. A command that
//! waits on the network does not block approvals, so two operators attaching
//! to each other at the same time still get prompted.

use std::fmt::Write as _;
use std::str::FromStr;
use log::{debug, warn};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::broadcast::error::RecvError;
use crate::RouterId;
use crate::protocol::{ApprovalQueue, ApprovalRequest, Delivery, Router};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Attach { host: String, port: u16, neighbor: RouterId, weight: u32 },
    Connect { host: String, port: u16, neighbor: RouterId, weight: u32 },
    Start,
    Disconnect { port: usize },
    Update { port: usize, weight: u32 },
    Detect { destination: RouterId },
    Neighbors,
    Ports,
    Lsd,
    Send { destination: RouterId, message: String },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0} (type help)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid {what}: {value}")]
    Invalid { what: &'static str, value: String },
}

const ATTACH_USAGE: &str = "attach <process IP> <process port> <simulated IP> <weight>";
const CONNECT_USAGE: &str = "connect <process IP> <process port> <simulated IP> <weight>";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match word.to_ascii_lowercase().as_str() {
            "attach" => {
                let (host, port, neighbor, weight) = link_args(&args, ATTACH_USAGE)?;
                Ok(Command::Attach { host, port, neighbor, weight })
            }
            "connect" => {
                let (host, port, neighbor, weight) = link_args(&args, CONNECT_USAGE)?;
                Ok(Command::Connect { host, port, neighbor, weight })
            }
            "start" => Ok(Command::Start),
            "disconnect" => match args.as_slice() {
                [port] => Ok(Command::Disconnect { port: number(port, "port")? }),
                _ => Err(CommandError::Usage("disconnect <port>")),
            },
            "update" => match args.as_slice() {
                [port, weight] => Ok(Command::Update {
                    port: number(port, "port")?,
                    weight: number(weight, "weight")?,
                }),
                _ => Err(CommandError::Usage("update <port> <weight>")),
            },
            "detect" => match args.as_slice() {
                [destination] => Ok(Command::Detect { destination: destination.to_string() }),
                _ => Err(CommandError::Usage("detect <simulated IP>")),
            },
            "neighbors" => Ok(Command::Neighbors),
            "ports" => Ok(Command::Ports),
            "lsd" => Ok(Command::Lsd),
            "send" => match rest.split_once(char::is_whitespace) {
                Some((destination, message)) if !message.trim().is_empty() => Ok(Command::Send {
                    destination: destination.to_string(),
                    message: message.trim_start().to_string(),
                }),
                _ => Err(CommandError::Usage("send <simulated IP> <message>")),
            },
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn link_args(args: &[&str], usage: &'static str) -> Result<(String, u16, RouterId, u32), CommandError> {
    match args {
        [host, port, neighbor, weight] => Ok((
            host.to_string(),
            number(port, "process port")?,
            neighbor.to_string(),
            number(weight, "weight")?,
        )),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn number<T: FromStr>(value: &str, what: &'static str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::Invalid {
        what,
        value: value.to_string(),
    })
}

pub fn help_text() -> &'static str {
    "Commands:\n\
     \x20 attach <process IP> <process port> <simulated IP> <weight>   link a port to a router (INIT)\n\
     \x20 connect <process IP> <process port> <simulated IP> <weight>  attach and bring the link up\n\
     \x20 start                      send HELLO over every link\n\
     \x20 disconnect <port>          remove the link on a port\n\
     \x20 update <port> <weight>     change a link weight\n\
     \x20 detect <simulated IP>      print the shortest path\n\
     \x20 neighbors                  list TWO_WAY neighbors\n\
     \x20 ports                      show the port table\n\
     \x20 lsd                        dump the link state database\n\
     \x20 send <simulated IP> <msg>  send a message\n\
     \x20 quit                       disconnect everything and exit"
}

/// Runs one command against the router. `None` means the router's own
/// notices already say everything.
pub async fn execute(router: &Router, command: Command) -> Option<String> {
    match command {
        Command::Attach { host, port, neighbor, weight } => {
            match router.attach(&host, port, &neighbor, weight).await {
                Ok(_) => None,
                Err(e) => Some(format!("attach failed: {}", e)),
            }
        }
        Command::Connect { host, port, neighbor, weight } => {
            match router.connect(&host, port, &neighbor, weight).await {
                Ok(_) => None,
                Err(e) => Some(format!("connect failed: {}", e)),
            }
        }
        Command::Start => match router.start().await {
            Ok(0) => Some("no new adjacencies".to_string()),
            Ok(count) => Some(format!("{} adjacencies up", count)),
            Err(e) => Some(format!("start failed: {}", e)),
        },
        Command::Disconnect { port } => match router.disconnect(port).await {
            Ok(_) => None,
            Err(e) => Some(format!("disconnect failed: {}", e)),
        },
        Command::Update { port, weight } => match router.update_weight(port, weight).await {
            Ok(()) => Some(format!("port {} weight set to {}", port, weight)),
            Err(e) => Some(format!("update failed: {}", e)),
        },
        Command::Detect { destination } => match router.detect(&destination).await {
            Ok(path) => Some(path.to_string()),
            Err(_) => Some("No path found".to_string()),
        },
        Command::Neighbors => {
            let neighbors = router.neighbors().await;
            if neighbors.is_empty() {
                Some("no neighbors".to_string())
            } else {
                Some(neighbors.join("\n"))
            }
        }
        Command::Ports => {
            let links = router.ports().await;
            if links.is_empty() {
                return Some("no links".to_string());
            }
            let mut table = format!(
                "{:<6} {:<16} {:<22} {:<8} {:<8} {}",
                "PORT", "NEIGHBOR", "ADDRESS", "STATE", "WEIGHT", "LAST HELLO"
            );
            for link in links {
                let _ = write!(table, "\n{}", link);
            }
            Some(table)
        }
        Command::Lsd => Some(router.database().await.to_string().trim_end().to_string()),
        Command::Send { destination, message } => match router.send(&destination, &message).await {
            Ok(Delivery::Sent { next_hop }) => {
                debug!("Message for {} handed to {}", destination, next_hop);
                None
            }
            Ok(Delivery::Local) | Ok(Delivery::NoPath(_)) => None,
            Err(e) => Some(format!("send failed: {}", e)),
        },
        Command::Help => Some(help_text().to_string()),
        Command::Quit => {
            router.quit().await;
            None
        }
    }
}

pub struct Console<R, W> {
    router: Router,
    lines: Lines<R>,
    writer: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(router: Router, reader: R, writer: W) -> Self {
        Self {
            router,
            lines: reader.lines(),
            writer,
        }
    }

    /// Serves the operator until `quit` or end of input. Either way the
    /// router is shut down before this returns.
    pub async fn run(mut self, mut approvals: ApprovalQueue) -> io::Result<()> {
        let mut notices = self.router.subscribe();

        loop {
            tokio::select! {
                biased;
                Some(request) = approvals.next() => self.ask(request).await?,
                notice = notices.recv() => match notice {
                    Ok(notice) => self.print(&notice.to_string()).await?,
                    Err(RecvError::Lagged(skipped)) => warn!("Console skipped {} notices", skipped),
                    Err(RecvError::Closed) => break,
                },
                line = self.lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => {
                            self.router.quit().await;
                            return Ok(());
                        }
                        Ok(command) => self.run_command(command, &mut approvals).await?,
                        Err(e) => self.print(&e.to_string()).await?,
                    }
                }
            }
        }

        self.router.quit().await;
        Ok(())
    }

    /// Runs a command while still answering approval requests that arrive
    /// in the meantime.
    async fn run_command(&mut self, command: Command, approvals: &mut ApprovalQueue) -> io::Result<()> {
        let router = self.router.clone();
        let work = async move { execute(&router, command).await };
        tokio::pin!(work);

        let output = loop {
            tokio::select! {
                biased;
                Some(request) = approvals.next() => self.ask(request).await?,
                output = &mut work => break output,
            }
        };

        if let Some(output) = output {
            self.print(&output).await?;
        }
        Ok(())
    }

    /// Prompts until the operator answers Y or N. Losing the input rejects.
    async fn ask(&mut self, request: ApprovalRequest) -> io::Result<()> {
        loop {
            self.print(&format!(
                "received HELLO from {};\nDo you accept this request? (Y/N)",
                request.hello.router_id
            ))
            .await?;

            let Some(answer) = self.lines.next_line().await? else {
                request.resolve(false);
                return Ok(());
            };

            match answer.trim().to_ascii_uppercase().as_str() {
                "Y" => {
                    request.resolve(true);
                    return Ok(());
                }
                "N" => {
                    request.resolve(false);
                    return Ok(());
                }
                _ => continue,
            }
        }
    }

    async fn print(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(format!("{}\n", text).as_bytes()).await?;
        self.writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::protocol::messages::{HelloMessage, ProcessAddress};
    use tokio::io::{duplex, AsyncReadExt, BufReader};

    #[test]
    fn parses_link_commands() {
        assert_eq!(
            "attach 127.0.0.1 5001 10.0.0.2 3".parse::<Command>(),
            Ok(Command::Attach {
                host: "127.0.0.1".to_string(),
                port: 5001,
                neighbor: "10.0.0.2".to_string(),
                weight: 3,
            })
        );
        assert!(matches!("CONNECT h 1 10.0.0.2 1".parse::<Command>(), Ok(Command::Connect { .. })));
        assert_eq!("update 2 7".parse::<Command>(), Ok(Command::Update { port: 2, weight: 7 }));
        assert_eq!("disconnect 0".parse::<Command>(), Ok(Command::Disconnect { port: 0 }));
    }

    #[test]
    fn send_keeps_the_whole_message() {
        assert_eq!(
            "send 10.0.0.4   hello there  world".parse::<Command>(),
            Ok(Command::Send {
                destination: "10.0.0.4".to_string(),
                message: "hello there  world".to_string(),
            })
        );
        assert_eq!("send 10.0.0.4".parse::<Command>(), Err(CommandError::Usage("send <simulated IP> <message>")));
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!("frobnicate".parse::<Command>(), Err(CommandError::Unknown("frobnicate".to_string())));
        assert_eq!("attach 1 2 3".parse::<Command>(), Err(CommandError::Usage(ATTACH_USAGE)));
        assert_eq!(
            "update 1 heavy".parse::<Command>(),
            Err(CommandError::Invalid { what: "weight", value: "heavy".to_string() })
        );
    }

    fn hello(id: &str) -> HelloMessage {
        HelloMessage {
            router_id: id.to_string(),
            process_addr: ProcessAddress::new("127.0.0.1", 1),
            dst: Some("10.0.0.1".to_string()),
        }
    }

    #[tokio::test]
    async fn prompts_in_order_and_reprompts_on_garbage() {
        let (router, _unused) = Router::new(&RouterConfig::new("10.0.0.1"));

        // Queued before the console starts, so both are answered ahead of
        // any command.
        let (approvals, queue) = crate::protocol::approval::channel();
        let first = approvals.submit(hello("10.0.0.2"));
        let second = approvals.submit(hello("10.0.0.3"));

        let input = BufReader::new(&b"maybe\ny\nN\n"[..]);
        let (writer, mut output) = duplex(4096);
        Console::new(router, input, writer).run(queue).await.unwrap();

        assert!(first.decision().await);
        assert!(!second.decision().await);

        let mut printed = String::new();
        output.read_to_string(&mut printed).await.unwrap();
        let asked: Vec<&str> = printed.lines().filter(|l| l.starts_with("received HELLO")).collect();
        assert_eq!(
            asked,
            vec![
                "received HELLO from 10.0.0.2;",
                "received HELLO from 10.0.0.2;",
                "received HELLO from 10.0.0.3;",
            ]
        );
    }

    #[tokio::test]
    async fn answers_queries_and_self_sends() {
        let (router, queue) = Router::new(&RouterConfig::new("10.0.0.1"));
        let input = BufReader::new(&b"neighbors\ndetect 10.0.0.1\ndetect 10.0.0.9\nsend 10.0.0.1 hi there\nbogus\n"[..]);
        let (writer, mut output) = duplex(4096);
        Console::new(router, input, writer).run(queue).await.unwrap();

        let mut printed = String::new();
        output.read_to_string(&mut printed).await.unwrap();
        assert!(printed.contains("no neighbors"));
        assert!(printed.contains("10.0.0.1\n"));
        assert!(printed.contains("No path found"));
        assert!(printed.contains("Received message from 10.0.0.1:\nhi there"));
        assert!(printed.contains("unknown command: bogus"));
    }
}
