//! Chat Relay - Interactive Client
//!
//! Sends the display name, then relays stdin lines to the server and
//! prints everything the server sends back.

use std::env;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, FramedRead, LinesCodec};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::peer::compose_line;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(addr), Some(name)) = (args.next(), args.next()) else {
        return Err("usage: chat_client ADDR NAME".into());
    };

    let stream = TcpStream::connect(&addr).await?;
    info!("Connected to {} as '{}'", addr, name);

    let mut framed = Framed::new(stream, LinesCodec::new());
    framed.send(name.clone()).await?;
    let (mut outgoing, mut incoming) = framed.split::<String>();
    let mut stdin = FramedRead::new(tokio::io::stdin(), LinesCodec::new());

    loop {
        tokio::select! {
            line = incoming.next() => match line {
                Some(Ok(line)) => println!("{}", line),
                Some(Err(e)) => {
                    error!("Connection error: {}", e);
                    break;
                }
                None => {
                    info!("Server closed the connection");
                    break;
                }
            },
            input = stdin.next() => match input {
                Some(Ok(input)) => outgoing.send(compose_line(&name, &input)).await?,
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    Ok(())
}
