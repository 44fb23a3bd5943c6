//! CLI command implementations.

pub mod actions;
pub mod watch;

use chatlog_client::{ClientSession, HttpTransport, MessageCollection, ReqwestClient};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// A session talking HTTP through reqwest.
pub type HttpSession = ClientSession<HttpTransport<ReqwestClient>>;

/// Line reader over stdin.
pub type Input = Lines<BufReader<Stdin>>;

/// Opens a line reader over stdin.
pub fn input() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Reads one trimmed line. `None` at end of input.
pub async fn read_line(input: &mut Input) -> std::io::Result<Option<String>> {
    Ok(input
        .next_line()
        .await?
        .map(|line| line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Prints the log in timestamp order.
pub fn print_messages(messages: &MessageCollection) {
    print!("{}", render_messages(messages));
}

/// Formats one snapshot as shown by `watch`: a count header over the log,
/// both taken from the same snapshot.
pub fn render_update(messages: &MessageCollection) -> String {
    format!(
        "--- {} message(s) ---\n{}",
        messages.len(),
        render_messages(messages)
    )
}

/// Formats the log in timestamp order, one line per message.
pub fn render_messages(messages: &MessageCollection) -> String {
    if messages.is_empty() {
        return "(no messages)\n".to_string();
    }
    let mut out = String::new();
    for message in messages.by_timestamp() {
        let local = message.timestamp.with_timezone(&chrono::Local);
        out.push_str(&format!(
            "[{}] {}  ({})\n",
            local.format("%Y-%m-%d %H:%M:%S"),
            message.content,
            message.id
        ));
    }
    out
}
