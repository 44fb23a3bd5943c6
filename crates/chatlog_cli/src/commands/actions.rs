//! One-shot commands: list, post, delete, clear.

use super::{input, print_messages, read_line, HttpSession};
use chatlog_client::{ClientConfig, MessageId, Secret};
use tracing::info;

/// Fetches once and prints the log.
pub async fn list(config: ClientConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = HttpSession::connect(config)?;
    session.sync_loop().resync().await?;
    let messages = session.messages();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&*messages)?),
        _ => print_messages(&messages),
    }
    Ok(())
}

/// Posts one message.
pub async fn post(config: ClientConfig, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = HttpSession::connect(config)?;
    let created = session.dispatcher().post(content).await?;
    println!("✓ Posted {}", created.id);
    Ok(())
}

/// Deletes one message.
pub async fn delete(config: ClientConfig, id: String) -> Result<(), Box<dyn std::error::Error>> {
    let session = HttpSession::connect(config)?;
    let id = MessageId::new(id);
    session.dispatcher().delete_one(&id).await?;
    println!("✓ Deleted {}", id);
    Ok(())
}

/// Clears the whole log.
pub async fn clear(
    config: ClientConfig,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = HttpSession::connect(config)?;
    let secret = match password {
        Some(password) => Secret::from(password),
        None => {
            println!("Password:");
            let line = read_line(&mut input()).await?.unwrap_or_default();
            Secret::from(line)
        }
    };

    match session.dispatcher().clear_all(secret).await {
        Ok(()) => {
            info!("log cleared from cli");
            println!("✓ All messages cleared");
            Ok(())
        }
        Err(e) if e.is_authorization_failure() => Err("invalid password".into()),
        Err(e) => Err(e.into()),
    }
}
