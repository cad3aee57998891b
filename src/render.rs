//! HTML rendering of a transcript as a chat container

use crate::formatter::{self, escape_html};
use crate::transcript::{Transcript, Turn, TurnKind};

const WELCOME: &str = concat!(
    r#"<div class="welcome-message">"#,
    "<h2>👋 Welcome!</h2>",
    "<p>Upload a document to get started. Once uploaded, you can ask any questions about its content.</p>",
    "</div>"
);

const TYPING_INDICATOR: &str = concat!(
    r#"<div class="message bot"><div class="message-content loading">"#,
    r#"<div class="typing-indicator"><span></span><span></span><span></span></div>"#,
    "</div></div>"
);

/// How bot answers are turned into markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    /// Answer text is trusted and emitted as-is around the generated tags
    #[default]
    Raw,
    /// Answer text is escaped before formatting
    Escaped,
}

impl Markup {
    fn answer(self, text: &str) -> String {
        match self {
            Markup::Raw => formatter::format(text),
            Markup::Escaped => formatter::format_escaped(text),
        }
    }
}

/// Render the whole chat container
pub fn render_transcript(transcript: &Transcript, markup: Markup) -> String {
    let mut out = String::from(r#"<div class="chat-container">"#);

    if transcript.is_welcome() {
        out.push_str(WELCOME);
    } else {
        for turn in &transcript.turns {
            render_turn(&mut out, turn, markup);
        }
        if transcript.is_busy() {
            out.push_str(TYPING_INDICATOR);
        }
    }

    out.push_str("</div>");
    out
}

fn render_turn(out: &mut String, turn: &Turn, markup: Markup) {
    match turn {
        Turn::User { content } | Turn::System { content } => {
            plain_message(out, turn.kind(), content);
        }
        Turn::Bot { content } => answer_message(out, content, markup),
        Turn::HistoryPair { question, answer } => {
            out.push_str("<div>");
            plain_message(out, TurnKind::User, question);
            answer_message(out, answer, markup);
            out.push_str("</div>");
        }
    }
}

fn plain_message(out: &mut String, kind: TurnKind, text: &str) {
    let class = match kind {
        TurnKind::User | TurnKind::HistoryPair => "user",
        TurnKind::Bot => "bot",
        TurnKind::System => "system",
    };
    out.push_str(&format!(
        r#"<div class="message {class}"><div class="message-content"><p>{}</p></div></div>"#,
        escape_html(text)
    ));
}

fn answer_message(out: &mut String, text: &str, markup: Markup) {
    out.push_str(&format!(
        r#"<div class="message bot"><div class="message-content"><div>{}</div></div></div>"#,
        markup.answer(text)
    ));
}
