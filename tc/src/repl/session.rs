//! Interactive chat session rendering
//!
//! Presentational collaborator: reads snapshots and events, never mutates
//! session state directly. All mutation goes through orchestrator commands.

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::api::TripPreferences;
use crate::events::{EventBus, SessionEvent};
use crate::session::{Sender, SessionError, SessionOrchestrator, SessionSnapshot};

/// Interactive chat REPL
pub struct ChatRepl {
    session: SessionOrchestrator,
    events: broadcast::Receiver<SessionEvent>,
    /// Transcript turns already printed
    rendered_turns: usize,
    itinerary_rendered: bool,
}

enum SlashResult {
    Continue,
    Quit,
}

impl ChatRepl {
    pub fn new(session: SessionOrchestrator, bus: &EventBus) -> Self {
        Self {
            session,
            events: bus.subscribe(),
            rendered_turns: 0,
            itinerary_rendered: false,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_message: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(message) = initial_message {
            println!("{} {}", ">".bright_green(), message);
            self.process_chat(&message).await?;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            // Surface anything that arrived while the last command ran
            // (late weather, server notices, chained recommendations)
            self.drain_events();
            self.render_progress().await?;

            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await? {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_chat(input).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        let _ = self.session.shutdown().await;
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Tripchat".bright_cyan().bold());
        println!(
            "Chat about a trip, then {} to plan together. Type {} for commands, {} to quit",
            "/prefs".yellow(),
            "/help".yellow(),
            "/quit".yellow()
        );
        println!();
    }

    async fn process_chat(&mut self, text: &str) -> Result<()> {
        match self.session.send_message(text).await {
            Ok(()) => self.render_progress().await,
            Err(SessionError::Busy) => {
                println!("{}", "A reply is still in flight; wait for it to finish.".yellow());
                Ok(())
            }
            Err(e) => Err(eyre::eyre!("Session error: {}", e)),
        }
    }

    async fn handle_slash_command(&mut self, input: &str) -> Result<SlashResult> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
            }
            "/quit" | "/q" | "/exit" => return Ok(SlashResult::Quit),
            "/status" | "/s" => {
                let snap = self.snapshot().await?;
                self.render_status(&snap);
            }
            "/prefs" => {
                if parts.len() != 5 {
                    println!("{}", "Usage: /prefs <location> <budget> <dates> <mode>".yellow());
                    return Ok(SlashResult::Continue);
                }
                let prefs = TripPreferences {
                    location: parts[1].to_string(),
                    budget: parts[2].to_string(),
                    dates: parts[3].to_string(),
                    mode: parts[4].to_string(),
                };
                match self.session.submit_preferences(prefs).await {
                    Ok(()) => println!("{}", "Preferences submitted.".dimmed()),
                    Err(e) => println!("{}", format!("Could not submit preferences: {}", e).red()),
                }
            }
            "/recs" => {
                if let Err(e) = self.session.fetch_recommendations().await {
                    println!("{}", format!("Could not fetch recommendations: {}", e).red());
                }
                self.render_progress().await?;
                let snap = self.snapshot().await?;
                self.render_recommendations(&snap);
            }
            "/vote" => {
                if parts.len() < 2 {
                    println!("{}", "Usage: /vote <trip name>".yellow());
                    return Ok(SlashResult::Continue);
                }
                let trip_name = parts[1..].join(" ");
                match self.session.vote_for_trip(&trip_name).await {
                    Ok(()) => println!("{}", format!("Voted for '{}'.", trip_name).dimmed()),
                    Err(e) => println!("{}", format!("Vote failed: {}", e).red()),
                }
            }
            "/finalize" => {
                if let Err(e) = self.session.finalize_trip().await {
                    println!("{}", format!("Finalize failed: {}", e).red());
                }
                self.render_progress().await?;
            }
            _ => {
                println!("{}", format!("Unknown command: {}", cmd).yellow());
            }
        }

        Ok(SlashResult::Continue)
    }

    fn print_help(&self) {
        println!("{}", "Commands:".bold());
        println!("  {}                       show session status", "/status".yellow());
        println!(
            "  {}  submit group preferences",
            "/prefs <loc> <budget> <dates> <mode>".yellow()
        );
        println!("  {}                         fetch trip recommendations", "/recs".yellow());
        println!("  {}             vote for a recommended trip", "/vote <trip name>".yellow());
        println!("  {}                     finalize and fetch the itinerary", "/finalize".yellow());
        println!("  {}                         quit", "/quit".yellow());
        println!("Anything else is sent to the assistant.");
    }

    async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.session
            .snapshot()
            .await
            .map_err(|e| eyre::eyre!("Session error: {}", e))
    }

    /// Print transcript turns and itinerary not shown yet
    async fn render_progress(&mut self) -> Result<()> {
        let snap = self.snapshot().await?;

        for turn in &snap.transcript[self.rendered_turns.min(snap.transcript.len())..] {
            if turn.sender == Sender::Assistant {
                println!("{}", turn.text.cyan());
            }
        }
        self.rendered_turns = snap.transcript.len();

        if !self.itinerary_rendered
            && let Some(itinerary) = &snap.itinerary
        {
            println!();
            println!("{}", itinerary);
            println!();
            self.itinerary_rendered = true;
        }

        Ok(())
    }

    /// Print late-arriving notices collected since the last prompt
    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::WeatherChanged { weather: Some(w) }) => {
                    println!(
                        "{}",
                        format!("Weather: {}, {:.0}\u{b0}C", w.description, w.temperature).yellow()
                    );
                }
                Ok(SessionEvent::ServerNotice { data }) => {
                    println!("{}", format!("[server] {}", data).dimmed());
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }

    fn render_status(&self, snap: &SessionSnapshot) {
        println!("{}", "Transcript:".bold());
        for turn in &snap.transcript {
            match turn.sender {
                Sender::User => println!("  {} {}", ">".bright_green(), turn.text),
                Sender::Assistant => println!("  {}", turn.text.cyan()),
            }
        }

        match snap.location {
            Some(location) => println!("{} {}", "Location:".bold(), location),
            None => println!("{} unresolved", "Location:".bold()),
        }

        if let Some(w) = &snap.weather {
            println!("{} {}, {:.0}\u{b0}C", "Weather:".bold(), w.description, w.temperature);
        }

        if !snap.points_of_interest.is_empty() {
            println!("{}", "Points of interest:".bold());
            for poi in &snap.points_of_interest {
                let name = poi.name.as_deref().unwrap_or("(unnamed)");
                println!("  - {} ({})", name, poi.kind);
            }
        }

        self.render_recommendations(snap);

        if snap.itinerary.is_some() {
            println!("{} finalized", "Itinerary:".bold());
        }
    }

    fn render_recommendations(&self, snap: &SessionSnapshot) {
        if snap.recommendations.is_empty() {
            return;
        }
        println!("{}", "Recommended trips:".bold());
        for trip in &snap.recommendations {
            let votes = match trip.votes {
                1 => "1 vote".to_string(),
                n => format!("{} votes", n),
            };
            println!("  - {} ({}) - {}", trip.name.bold(), trip.style, votes);
        }
    }
}
