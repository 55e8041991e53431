use super::{ Navigator, Screen };
use crate::llm::chat::ChatClient;
use crate::llm::ChatError;
use crate::models::chat::{ format_timestamp, ChatMessage, Role };
use crate::session::{ ChatSession, Rejected, TurnError };
use log::{ debug, error };
use std::io::{ self, Write };
use std::sync::Arc;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt };
use tokio::sync::mpsc;

pub const ERROR_NOTICE: &str = "Es gab einen Fehler bei der Verarbeitung Ihrer Anfrage.";

const CHAT_HELP: &str = "Commands: /clear, /history, /settings, /quit";
const SETTINGS_HELP: &str = "Type a new server URL, then /save (or /back to discard)";

enum Flow {
    Continue,
    Quit,
}

struct Terminal<'a, W: Write> {
    session: ChatSession,
    client: Arc<dyn ChatClient>,
    nav: Navigator,
    draft_url: String,
    replies: mpsc::Sender<Result<String, ChatError>>,
    out: &'a mut W,
}

/// Drives the chat and settings screens from `input` until EOF or `/quit`.
///
/// Requests run on their own task; their outcome comes back through a channel
/// and is applied here, so only this loop ever mutates the session.
pub async fn run_terminal<R, W>(
    session: ChatSession,
    client: Arc<dyn ChatClient>,
    input: R,
    out: &mut W
) -> io::Result<ChatSession>
    where R: AsyncBufRead + Unpin, W: Write
{
    let (tx, mut rx) = mpsc::channel(1);
    let mut term = Terminal {
        draft_url: session.base_url().to_string(),
        session,
        client,
        nav: Navigator::new(),
        replies: tx,
        out,
    };
    let mut lines = input.lines();

    term.render_history()?;
    writeln!(term.out, "{}", CHAT_HELP)?;

    loop {
        tokio::select! {
            Some(outcome) = rx.recv() => {
                term.apply_reply(outcome)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = term.handle_line(&line)? {
                    break;
                }
            }
        }
    }

    if term.session.is_processing() {
        debug!("Waiting for in-flight request before exiting");
        if let Some(outcome) = rx.recv().await {
            term.apply_reply(outcome)?;
        }
    }
    term.out.flush()?;
    Ok(term.session)
}

impl<'a, W: Write> Terminal<'a, W> {
    fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        match self.nav.current() {
            Screen::Chat => self.handle_chat(line),
            Screen::Settings => self.handle_settings(line),
        }
    }

    fn handle_chat(&mut self, line: &str) -> io::Result<Flow> {
        match line.trim() {
            "/quit" => {
                return Ok(Flow::Quit);
            }
            "/clear" => {
                match self.session.clear() {
                    Ok(()) => self.render_history()?,
                    Err(TurnError::Rejected(Rejected::Busy)) => {
                        writeln!(self.out, "Please wait for the current reply.")?;
                    }
                    Err(e) => self.notify(&e)?,
                }
            }
            "/history" => self.render_history()?,
            "/settings" => {
                self.nav.forward(Screen::Settings);
                self.draft_url = self.session.base_url().to_string();
                writeln!(self.out, "-- Settings --")?;
                writeln!(self.out, "Server URL: {}", self.draft_url)?;
                writeln!(self.out, "{}", SETTINGS_HELP)?;
            }
            _ => self.start_turn(line)?,
        }
        Ok(Flow::Continue)
    }

    fn handle_settings(&mut self, line: &str) -> io::Result<Flow> {
        match line.trim() {
            "/quit" => {
                return Ok(Flow::Quit);
            }
            "/back" => self.leave_settings()?,
            "/save" => {
                match self.session.set_base_url(&self.draft_url) {
                    Ok(()) => {
                        writeln!(self.out, "Saved server URL: {}", self.session.base_url())?;
                        self.leave_settings()?;
                    }
                    Err(e) => {
                        error!("Rejected server URL: {}", e);
                        writeln!(self.out, "[!] {}", e)?;
                    }
                }
            }
            "" => {}
            url => {
                self.draft_url = url.to_string();
                writeln!(self.out, "Server URL: {} (unsaved)", self.draft_url)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn leave_settings(&mut self) -> io::Result<()> {
        self.nav.back();
        writeln!(self.out, "-- Chat --")
    }

    fn start_turn(&mut self, line: &str) -> io::Result<()> {
        let turn = match self.session.submit(line) {
            Ok(turn) => turn,
            Err(Rejected::Empty) => {
                return Ok(());
            }
            Err(Rejected::Busy | Rejected::NoPendingTurn) => {
                return writeln!(self.out, "Please wait for the current reply.");
            }
        };

        let client = self.client.clone();
        let tx = self.replies.clone();
        tokio::spawn(async move {
            let outcome = client.send(&turn.history, &turn.base_url).await;
            let _ = tx.send(outcome).await;
        });
        writeln!(self.out, "...")
    }

    fn apply_reply(&mut self, outcome: Result<String, ChatError>) -> io::Result<()> {
        match self.session.complete(outcome) {
            Ok(reply) => {
                self.render_message(&reply.message)?;
                match reply.unsaved {
                    Some(e) => writeln!(self.out, "[!] {}", TurnError::Persist(e)),
                    None => Ok(()),
                }
            }
            Err(e) => self.notify(&e),
        }
    }

    fn notify(&mut self, err: &TurnError) -> io::Result<()> {
        match err {
            TurnError::Persist(e) => writeln!(self.out, "[!] {}", e),
            _ => writeln!(self.out, "[!] {}", ERROR_NOTICE),
        }
    }

    fn render_history(&mut self) -> io::Result<()> {
        for msg in self.session.messages().to_vec() {
            self.render_message(&msg)?;
        }
        Ok(())
    }

    fn render_message(&mut self, msg: &ChatMessage) -> io::Result<()> {
        let speaker = match msg.role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        writeln!(self.out, "[{}] {}: {}", format_timestamp(&msg.timestamp), speaker, msg.content)
    }
}
