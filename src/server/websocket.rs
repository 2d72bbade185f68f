use crate::agent::ChefAgent;
use crate::error::ChefError;
use crate::history::ConversationMemory;
use crate::models::recipe::MealCategory;
use crate::models::websocket::{ ClientMessage, ServerMessage };
use super::auth;

use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response, ErrorResponse };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;

use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };

use chrono::Utc;
use futures::{ SinkExt, StreamExt };
use futures::stream::SplitSink;
use log::{ info, warn, error, debug };
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::MIN.saturating_add(9)));
}

pub async fn start_ws_server(
    addr: &str,
    agent: Arc<ChefAgent>,
    api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS server listening on: {}", addr);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let agent_clone = Arc::clone(&agent);
        let required_api_key = api_key.clone();

        tokio::spawn(async move {
            if let Err(e) = process_connection(peer, stream, agent_clone, required_api_key).await {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

fn unauthorized(reason: String) -> ErrorResponse {
    let mut res = ErrorResponse::new(Some(reason));
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res
}

/// Performs the (optionally signed) handshake, then runs the session.
pub async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    agent: Arc<ChefAgent>,
    required_api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let secret = match &required_api_key {
            Some(k) if !k.is_empty() => k,
            _ => {
                return Ok(response);
            }
        };

        let query = req.uri().query().unwrap_or("");
        match auth::verify_query(secret, query, Utc::now().timestamp()) {
            Ok(()) => {
                debug!("{} authenticated", peer);
                Ok(response)
            }
            Err(e) => {
                warn!("{}: handshake rejected: {}", peer, e);
                Err(unauthorized(e.to_string()))
            }
        }
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, agent).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;

async fn send<S>(tx: &mut WsSink<S>, peer: SocketAddr, msg: &ServerMessage) -> bool
    where S: AsyncRead + AsyncWrite + Unpin
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message for {}: {}", peer, e);
            return true;
        }
    };
    match tx.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(e) => {
            error!("Error sending to {}: {}", peer, e);
            false
        }
    }
}

fn history_message(memory: &ConversationMemory) -> ServerMessage {
    ServerMessage::History {
        turns: memory.recent().into_iter().cloned().collect(),
    }
}

/// Runs one session. The connection owns its [`ConversationMemory`]; it is
/// dropped when the socket closes.
pub async fn handle_connection<S>(peer: SocketAddr, websocket: WebSocketStream<S>, agent: Arc<ChefAgent>)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let (mut tx, mut rx) = websocket.split();
    let session_id = Uuid::new_v4().to_string();
    let mut memory = ConversationMemory::new();
    info!("New session {} for {}", session_id, peer);

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                info!("WebSocket connection closed or errored for {}: {}", peer, e);
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!("Message from {} exceeds size limit ({} > {})", peer, message.len(), MAX_MESSAGE_SIZE);
            let _ = send(&mut tx, peer, &(ServerMessage::Error {
                message: "Message too large".to_string(),
            })).await;
            break;
        }

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(data) => {
                if tx.send(Message::Pong(data)).await.is_err() {
                    break;
                }
                continue;
            }
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
                continue;
            }
            Message::Pong(_) | Message::Frame(_) => {
                continue;
            }
        };

        let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(m) => m,
            Err(e) => {
                error!("Failed to parse message from {}: {}", peer, e);
                let reply = ServerMessage::Error { message: format!("Failed to parse message: {}", e) };
                if !send(&mut tx, peer, &reply).await {
                    break;
                }
                continue;
            }
        };

        let replies = match dispatch(&agent, &mut memory, client_msg, &mut tx, peer).await {
            Some(replies) => replies,
            None => {
                break;
            }
        };
        let mut open = true;
        for reply in replies {
            if !send(&mut tx, peer, &reply).await {
                open = false;
                break;
            }
        }
        if !open {
            break;
        }
    }
    info!("Session {} for {} closed", session_id, peer);
}

async fn dispatch<S>(
    agent: &ChefAgent,
    memory: &mut ConversationMemory,
    msg: ClientMessage,
    tx: &mut WsSink<S>,
    peer: SocketAddr
) -> Option<Vec<ServerMessage>>
    where S: AsyncRead + AsyncWrite + Unpin
{
    // None means the peer went away before the work started.
    let replies = match msg {
        ClientMessage::History => vec![history_message(memory)],
        ClientMessage::Chat { content } => {
            if content.trim().is_empty() {
                return Some(vec![ServerMessage::Error { message: "Message is empty".to_string() }]);
            }
            if !send(tx, peer, &ServerMessage::Processing).await {
                return None;
            }
            let reply = match agent.chat(memory, &content).await {
                Ok(content) =>
                    ServerMessage::Response {
                        content,
                        timestamp: Utc::now().timestamp(),
                    },
                Err(e) => ServerMessage::Error { message: format!("Chat failed: {}", e) },
            };
            vec![reply, history_message(memory)]
        }
        ClientMessage::Ideas { ingredients, category } => {
            let category: MealCategory = match category.parse() {
                Ok(c) => c,
                Err(e) => {
                    return Some(vec![ServerMessage::Error { message: format!("{}", e) }]);
                }
            };
            if !send(tx, peer, &ServerMessage::Processing).await {
                return None;
            }
            let ideas = agent.meal_ideas(memory, &ingredients, category).await;
            let reply = match ideas.error {
                Some(e) => ServerMessage::Error { message: format!("{} ({})", ideas.message, e) },
                None if ideas.recipes.is_empty() => ServerMessage::Empty { message: ideas.message },
                None =>
                    ServerMessage::Recipes {
                        category: ideas.category.to_string(),
                        message: ideas.message,
                        recipes: ideas.recipes,
                    },
            };
            vec![reply, history_message(memory)]
        }
        ClientMessage::Surprise => {
            if !send(tx, peer, &ServerMessage::Processing).await {
                return None;
            }
            let result = agent.surprise_me(memory).await;
            let message = memory
                .recent()
                .first()
                .map(|t| t.bot_text.clone())
                .unwrap_or_default();
            let reply = match result {
                Ok(recipe) => ServerMessage::Recipe { message, recipe },
                Err(ChefError::NotFound(_)) => ServerMessage::Empty { message },
                Err(e) => ServerMessage::Error { message: format!("{} ({})", message, e) },
            };
            vec![reply, history_message(memory)]
        }
    };
    Some(replies)
}
