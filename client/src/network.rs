use crate::input::{translate, InputEvent, RawTerminal};
use crate::rendering::Renderer;
use crossterm::event::{Event, EventStream};
use futures_util::{Stream, StreamExt};
use log::{debug, error, info};
use shared::frame::{payload_len, payload_text, HEADER_LEN};
use shared::{decode_game_state, DecodeError, FrameError, Framing, GameState, Map};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Read size for unframed snapshots.
const RAW_READ_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    #[error("bad frame: {0}")]
    Frame(#[from] FrameError),

    #[error("bad snapshot: {0}")]
    Decode(#[from] DecodeError),

    #[error("render task failed: {0}")]
    Task(String),
}

/// Splits the server byte stream back into snapshots.
pub struct FrameReader<R> {
    reader: R,
    framing: Framing,
    buf: Vec<u8>,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, framing: Framing) -> Self {
        Self {
            reader,
            framing,
            buf: Vec::new(),
        }
    }

    /// Waits for the next snapshot. `Ok(None)` means the server closed the
    /// connection.
    ///
    /// With length-prefixed framing a snapshot that fails to decode does not
    /// desynchronize the stream, so the caller may keep reading.
    pub async fn next_state(&mut self) -> Result<Option<GameState>, ClientError> {
        let len = match self.framing {
            Framing::LengthPrefixed => {
                let mut header = [0u8; HEADER_LEN];
                match self.reader.read_exact(&mut header).await {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                    Err(e) => return Err(e.into()),
                }
                let len = payload_len(header)?;
                self.buf.resize(len, 0);
                self.reader.read_exact(&mut self.buf).await?;
                len
            }
            Framing::Raw => {
                self.buf.resize(RAW_READ_LEN, 0);
                let n = self.reader.read(&mut self.buf).await?;
                if n == 0 {
                    return Ok(None);
                }
                n
            }
        };

        let text = payload_text(&self.buf[..len])?;
        Ok(Some(decode_game_state(text)?))
    }
}

pub struct Client {
    stream: TcpStream,
    framing: Framing,
    renderer: Renderer,
}

impl Client {
    pub async fn connect(addr: &str, framing: Framing) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle: {}", e);
        }
        info!("Connected to {}", addr);

        Ok(Client {
            stream,
            framing,
            renderer: Renderer::new(Map::arena()),
        })
    }

    /// Draws every snapshot the server sends while forwarding key presses
    /// as they happen, until the user quits or the server goes away.
    ///
    /// The terminal is in raw mode for the whole session and is restored
    /// before this returns, on success or error.
    pub async fn run(self) -> Result<(), ClientError> {
        let (reader, mut writer) = self.stream.into_split();
        let _terminal = RawTerminal::enable()?;
        let mut render = spawn_render(FrameReader::new(reader, self.framing), self.renderer);
        let mut keys = EventStream::new();

        let outcome = tokio::select! {
            result = forward_keys(&mut keys, &mut writer) => result.map(|sent| {
                info!("Disconnecting after {} commands", sent);
            }),
            result = &mut render => match result {
                Ok(outcome) => outcome,
                Err(e) => Err(ClientError::Task(e.to_string())),
            },
        };

        render.abort();
        outcome
    }
}

/// Sends one byte per bound key until a quit key or the end of input.
/// Returns how many commands were sent.
pub async fn forward_keys<S, W>(keys: &mut S, writer: &mut W) -> Result<usize, ClientError>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut sent = 0;
    while let Some(event) = keys.next().await {
        match translate(&event?) {
            Some(InputEvent::Action(action)) => {
                writer.write_all(&[action.to_byte()]).await?;
                sent += 1;
            }
            Some(InputEvent::Quit) => {
                info!("Quitting");
                break;
            }
            None => {}
        }
    }
    Ok(sent)
}

fn spawn_render(
    mut frames: FrameReader<OwnedReadHalf>,
    renderer: Renderer,
) -> JoinHandle<Result<(), ClientError>> {
    tokio::spawn(async move {
        loop {
            match frames.next_state().await {
                Ok(Some(state)) => renderer.draw(&state)?,
                Ok(None) => {
                    info!("Server closed the connection");
                    return Ok(());
                }
                Err(e) => {
                    error!("Dropping connection: {}", e);
                    return Err(e);
                }
            }
        }
    })
}
