use chrono::{DateTime, Utc};

use crate::action::Action;
use crate::api::{ApiClient, ApiError, GeneralResponse, HistoryEntry, NearbyResponse, PriceResponse, Product, Store};
use crate::command::CommandParser;
use crate::config::{ApiKeyStore, Config, COMMANDS};
use crate::geo::{DistanceRange, GeoError, Geocoder, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    General,
    Price,
    Nearby,
}

impl Mode {
    pub fn title(&self) -> &'static str {
        match self {
            Mode::General => "General AI Chat",
            Mode::Price => "Price Comparison",
            Mode::Nearby => "Nearby Stores",
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            Mode::General => "Switched to General Chat. How can I help you?",
            Mode::Price => {
                "Switched to Price Comparison. Enter a product name (e.g., 'Sony WH-1000XM5 headphones') to compare prices."
            }
            Mode::Nearby => "Switched to Nearby Stores. Let's find stores around you.",
        }
    }

    /// Tab cycling order
    pub fn next(&self) -> Mode {
        match self {
            Mode::General => Mode::Price,
            Mode::Price => Mode::Nearby,
            Mode::Nearby => Mode::General,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Clone)]
pub enum MessageBody {
    /// Plain text; bot text goes through the markdown renderer
    Text(String),
    /// Transient spinner placeholder with an optional label
    Loading(String),
    /// Instructions for acquiring a location
    LocationPrompt,
    /// Price-comparison result cards
    Products(Vec<Product>),
    /// Nearby-store result cards
    Stores(Vec<Store>),
}

#[derive(Clone)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
}

/// Work queued by an event handler and executed after the next draw, so the
/// loading placeholder is visible while the blocking request runs.
enum Pending {
    Chat { message: String, loading_id: u64 },
    Locate { query: Option<String>, loading_id: u64 },
}

enum ChatReply {
    General(GeneralResponse),
    Price(PriceResponse),
    Nearby(NearbyResponse),
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Geo(#[from] GeoError),
}

pub struct App {
    pub mode: Mode,
    pub messages: Vec<Message>,
    pub input: String,
    pub history: Vec<HistoryEntry>,
    pub country: &'static str,
    pub location: Option<Location>,
    pub range: DistanceRange,
    pub api_key: Option<String>,
    pub scroll_offset: usize,
    pub is_loading: bool,
    pub status_message: Option<String>,
    pub should_quit: bool,
    pub animation_tick: u64,
    // Command popup state
    pub command_selection: Option<usize>,

    pub config: Config,

    next_message_id: u64,
    status_ticks: u64,
    pending: Option<Pending>,
    key_store: ApiKeyStore,
    api: ApiClient,
    geocoder: Geocoder,
}

impl App {
    pub fn new(config: Config) -> Result<Self, InitError> {
        let api = ApiClient::new(config.api_base.clone())?;
        let geocoder = Geocoder::new()?;
        let key_store = ApiKeyStore::new();
        let api_key = key_store.load();
        let country = crate::config::detect_country();

        let mut app = Self {
            mode: Mode::General,
            messages: Vec::new(),
            input: String::new(),
            history: Vec::new(),
            country,
            location: None,
            range: DistanceRange::default(),
            api_key,
            scroll_offset: 0,
            is_loading: false,
            status_message: None,
            should_quit: false,
            animation_tick: 0,
            command_selection: None,
            next_message_id: 0,
            status_ticks: 0,
            pending: None,
            key_store,
            config,
            api,
            geocoder,
        };

        app.push_bot_text(format!(
            "Hello! I've detected your location as **{}**. I'll customize price comparisons for you.",
            country
        ));
        Ok(app)
    }

    pub fn tick(&mut self) {
        self.animation_tick += 1;

        if self.status_message.is_some() {
            self.status_ticks += 1;
            if self.status_ticks >= self.config.status_timeout_ticks {
                self.status_message = None;
                self.status_ticks = 0;
            }
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_ticks = 0;
    }

    // --- transcript -------------------------------------------------------

    /// Append a message and scroll to the end. Returns the generated id so
    /// transient entries can be removed later.
    pub fn push_message(&mut self, role: Role, body: MessageBody) -> u64 {
        self.next_message_id += 1;
        let id = self.next_message_id;
        self.messages.push(Message { id, role, body, timestamp: Utc::now() });
        self.scroll_offset = 0;
        id
    }

    pub fn remove_message(&mut self, id: u64) {
        self.messages.retain(|m| m.id != id);
    }

    fn push_bot_text(&mut self, text: impl Into<String>) -> u64 {
        self.push_message(Role::Bot, MessageBody::Text(text.into()))
    }

    /// Content of the most recent bot text reply, for the copy affordance.
    pub fn last_bot_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match (&m.role, &m.body) {
            (Role::Bot, MessageBody::Text(text)) => Some(text.as_str()),
            _ => None,
        })
    }

    // --- mode controller --------------------------------------------------

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.messages.clear();
        self.push_bot_text(mode.greeting());

        if mode == Mode::Nearby && self.location.is_none() {
            self.push_message(Role::Bot, MessageBody::LocationPrompt);
        }
    }

    pub fn cycle_mode(&mut self) {
        self.set_mode(self.mode.next());
    }

    // --- input / submit ---------------------------------------------------

    pub fn submit(&mut self) {
        let message = self.input.trim().to_string();
        if message.is_empty() {
            return;
        }
        self.input.clear();
        self.reset_command_selection();

        if message.starts_with('/') {
            self.run_command(&message);
            return;
        }

        self.push_message(Role::User, MessageBody::Text(message.clone()));

        // Nearby search is useless without coordinates; don't touch the network
        if self.mode == Mode::Nearby && self.location.is_none() {
            self.push_message(Role::Bot, MessageBody::LocationPrompt);
            self.push_bot_text("❌ Please set your location first with `/locate` before searching nearby stores.");
            return;
        }

        let loading_id = self.push_message(Role::Bot, MessageBody::Loading(String::new()));
        self.pending = Some(Pending::Chat { message, loading_id });
        self.is_loading = true;
    }

    // --- commands ---------------------------------------------------------

    fn run_command(&mut self, input: &str) {
        match CommandParser::parse(input) {
            Ok(action) => self.handle_action(action),
            Err(message) => {
                self.push_bot_text(message);
            }
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::SwitchMode(mode) => self.set_mode(mode),
            Action::Locate { query } => self.start_locate(query),
            Action::SetRange { min, max } => {
                self.range.set_min(min);
                self.range.set_max(max);
                self.set_status(format!(
                    "Search range: {}-{} km",
                    self.range.min(),
                    self.range.max()
                ));
            }
            Action::ApiKey { value: Some(key) } => match self.key_store.save(&key) {
                Ok(()) => {
                    self.api_key = Some(key.trim().to_string());
                    self.set_status("API key saved");
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to persist API key");
                    self.set_status(format!("Could not save API key: {}", e));
                }
            },
            Action::ApiKey { value: None } => {
                let notice = match &self.api_key {
                    Some(key) => format!("API key set ({} chars). Use /key <value> to replace it.", key.len()),
                    None => "No API key set. Use /key <value> to store one (the backend may have its own).".to_string(),
                };
                self.push_bot_text(notice);
            }
            Action::ClearChat => {
                self.messages.clear();
                self.history.clear();
                self.push_bot_text("Chat cleared. How can I help you?");
            }
            Action::Help => {
                let mut help = String::from("Available commands:\n");
                for (cmd, desc) in COMMANDS {
                    help.push_str(&format!("  {} - {}\n", cmd, desc));
                }
                self.push_bot_text(help);
            }
            Action::Quit => self.should_quit = true,
        }
    }

    fn start_locate(&mut self, query: Option<String>) {
        let label = match &query {
            None => "Getting your location...",
            Some(_) => "Finding location...",
        };
        let loading_id = self.push_message(Role::Bot, MessageBody::Loading(label.to_string()));
        self.pending = Some(Pending::Locate { query, loading_id });
        self.is_loading = true;
    }

    // --- deferred network work -------------------------------------------

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run the queued network request, if any. Called after a draw so the
    /// spinner placeholder has been shown at least once. Blocks until the
    /// request finishes; one request per user action, no retries.
    pub fn process_pending(&mut self) {
        let Some(pending) = self.pending.take() else { return };
        match pending {
            Pending::Chat { message, loading_id } => {
                let result = self.dispatch_chat(&message);
                self.finish_chat(&message, loading_id, result);
            }
            Pending::Locate { query, loading_id } => {
                let result = match &query {
                    None => self.geocoder.auto_detect(),
                    Some(q) => self.geocoder.search(q),
                };
                self.finish_locate(loading_id, result);
            }
        }
    }

    fn dispatch_chat(&self, message: &str) -> Result<ChatReply, ApiError> {
        let api_key = self.api_key.as_deref();
        match self.mode {
            Mode::General => self
                .api
                .general(message, api_key, &self.history)
                .map(ChatReply::General),
            Mode::Price => self
                .api
                .price(message, api_key, self.country)
                .map(ChatReply::Price),
            Mode::Nearby => {
                // submit() guarantees a location in Nearby mode
                let (lat, lon) = self
                    .location
                    .as_ref()
                    .map(|l| (l.latitude, l.longitude))
                    .unwrap_or_default();
                self.api
                    .nearby_stores(
                        message,
                        lat,
                        lon,
                        self.range.min() as f64,
                        self.range.max() as f64,
                        api_key,
                    )
                    .map(ChatReply::Nearby)
            }
        }
    }

    fn finish_chat(&mut self, message: &str, loading_id: u64, result: Result<ChatReply, ApiError>) {
        self.remove_message(loading_id);
        self.is_loading = false;

        match result {
            Ok(ChatReply::General(reply)) => {
                self.history.push(HistoryEntry::user(message));
                self.history.push(HistoryEntry::model(reply.response.clone()));
                self.push_bot_text(reply.response);
            }
            Ok(ChatReply::Price(reply)) => {
                self.push_bot_text(reply.response);
                if !reply.data.is_empty() {
                    self.push_message(Role::Bot, MessageBody::Products(reply.data));
                }
            }
            Ok(ChatReply::Nearby(reply)) => {
                self.push_bot_text(reply.response);
                if !reply.data.is_empty() {
                    self.push_message(Role::Bot, MessageBody::Stores(reply.data));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.push_bot_text(format!("Error: {}. Is the backend running?", e));
            }
        }
        self.scroll_offset = 0;
    }

    fn finish_locate(&mut self, loading_id: u64, result: Result<Location, GeoError>) {
        self.remove_message(loading_id);
        self.is_loading = false;

        match result {
            Ok(mut location) => {
                // Auto-detect has no address; fill one in via reverse lookup,
                // falling back to raw coordinates when that fails too.
                if location.display_name.is_none() {
                    match self.geocoder.reverse(location.latitude, location.longitude) {
                        Ok(name) => location.display_name = Some(name),
                        Err(e) => tracing::warn!(error = %e, "reverse geocoding failed"),
                    }
                }
                let summary = format!(
                    "✅ Location set: **{}**\n\nSearch distance {}-{} km (adjust with `/range <min> <max>`).\nNow enter a product name to find nearby stores!",
                    location.short_label(),
                    self.range.min(),
                    self.range.max()
                );
                self.location = Some(location);
                self.push_bot_text(summary);
            }
            Err(e) => {
                self.push_bot_text(e.user_message());
            }
        }
    }

    // --- command popup ----------------------------------------------------

    pub fn showing_command_popup(&self) -> bool {
        self.input.starts_with('/') && !self.input.contains(' ')
    }

    pub fn get_filtered_commands(&self) -> Vec<(&'static str, &'static str)> {
        if !self.input.starts_with('/') {
            return vec![];
        }
        let filter = &self.input[1..];
        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd[1..].starts_with(filter))
            .copied()
            .collect()
    }

    pub fn command_select_up(&mut self) {
        let filtered = self.get_filtered_commands();
        if filtered.is_empty() {
            return;
        }
        self.command_selection = match self.command_selection {
            None => Some(filtered.len() - 1),
            Some(0) => None,
            Some(n) => Some(n - 1),
        };
    }

    pub fn command_select_down(&mut self) {
        let filtered = self.get_filtered_commands();
        if filtered.is_empty() {
            return;
        }
        self.command_selection = match self.command_selection {
            None => Some(0),
            Some(n) if n >= filtered.len() - 1 => None,
            Some(n) => Some(n + 1),
        };
    }

    pub fn apply_command_selection(&mut self) {
        if let Some(idx) = self.command_selection {
            let filtered = self.get_filtered_commands();
            if let Some((cmd, _)) = filtered.get(idx) {
                self.input = cmd.to_string();
            }
        }
        self.command_selection = None;
    }

    pub fn reset_command_selection(&mut self) {
        self.command_selection = None;
    }

    // --- scrolling --------------------------------------------------------

    pub fn scroll_up(&mut self) {
        self.scroll_offset += self.config.scroll_step;
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(self.config.scroll_step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(Config::default()).unwrap()
    }

    fn bot_texts(app: &App) -> Vec<&str> {
        app.messages
            .iter()
            .filter_map(|m| match (&m.role, &m.body) {
                (Role::Bot, MessageBody::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_startup_greeting_mentions_country() {
        let app = app();
        let texts = bot_texts(&app);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains(app.country));
    }

    #[test]
    fn test_mode_switch_clears_and_greets_once() {
        let mut app = app();
        app.push_message(Role::User, MessageBody::Text("hello".into()));

        app.set_mode(Mode::Price);

        assert_eq!(app.messages.len(), 1);
        assert_eq!(bot_texts(&app), vec![Mode::Price.greeting()]);
    }

    #[test]
    fn test_nearby_mode_without_location_prompts() {
        let mut app = app();
        app.set_mode(Mode::Nearby);

        assert_eq!(bot_texts(&app), vec![Mode::Nearby.greeting()]);
        assert!(app.messages.iter().any(|m| matches!(m.body, MessageBody::LocationPrompt)));
    }

    #[test]
    fn test_nearby_mode_with_location_skips_prompt() {
        let mut app = app();
        app.location = Some(Location {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: 0.0,
            display_name: None,
        });

        app.set_mode(Mode::Nearby);

        assert!(!app.messages.iter().any(|m| matches!(m.body, MessageBody::LocationPrompt)));
    }

    #[test]
    fn test_empty_submit_is_a_noop() {
        let mut app = app();
        let before = app.messages.len();

        app.input = "   ".to_string();
        app.submit();

        assert_eq!(app.messages.len(), before);
        assert!(!app.has_pending());
    }

    #[test]
    fn test_submit_queues_request_with_placeholder() {
        let mut app = app();
        app.input = "how are you".to_string();

        app.submit();

        assert!(app.has_pending());
        assert!(app.is_loading);
        assert!(app.messages.iter().any(|m| matches!(m.body, MessageBody::Loading(_))));
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_nearby_submit_without_location_never_queues() {
        let mut app = app();
        app.set_mode(Mode::Nearby);
        app.input = "laptops".to_string();

        app.submit();

        assert!(!app.has_pending());
        assert!(bot_texts(&app).iter().any(|t| t.contains("/locate")));
    }

    #[test]
    fn test_general_success_appends_history_pair() {
        let mut app = app();
        let loading_id = app.push_message(Role::Bot, MessageBody::Loading(String::new()));

        app.finish_chat(
            "hi there",
            loading_id,
            Ok(ChatReply::General(GeneralResponse { response: "hello!".to_string() })),
        );

        assert_eq!(app.history.len(), 2);
        assert_eq!(app.history[0], HistoryEntry::user("hi there"));
        assert_eq!(app.history[1], HistoryEntry::model("hello!"));
        assert!(!app.messages.iter().any(|m| matches!(m.body, MessageBody::Loading(_))));
    }

    #[test]
    fn test_price_success_renders_product_grid() {
        let mut app = app();
        app.set_mode(Mode::Price);
        let loading_id = app.push_message(Role::Bot, MessageBody::Loading(String::new()));

        let reply: PriceResponse = serde_json::from_str(
            r#"{
                "response": "Here are the price comparisons I found:",
                "data": [
                    {"source": "Amazon", "title": "Sony WH-1000XM5 headphones",
                     "price": "$348.00", "link": "https://a.example/1"},
                    {"source": "BestBuy", "title": "Sony WH-1000XM5 headphones",
                     "price": "$329.99", "link": "https://b.example/2", "is_estimate": true}
                ]
            }"#,
        )
        .unwrap();

        app.finish_chat("Sony WH-1000XM5 headphones", loading_id, Ok(ChatReply::Price(reply)));

        assert!(bot_texts(&app).iter().any(|t| t.contains("price comparisons")));
        let products = app.messages.iter().find_map(|m| match &m.body {
            MessageBody::Products(p) => Some(p),
            _ => None,
        });
        assert_eq!(products.map(Vec::len), Some(2));
        // Price mode never touches general-chat history
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_price_without_data_renders_text_only() {
        let mut app = app();
        app.set_mode(Mode::Price);
        let loading_id = app.push_message(Role::Bot, MessageBody::Loading(String::new()));

        app.finish_chat(
            "obscure gadget",
            loading_id,
            Ok(ChatReply::Price(PriceResponse {
                response: "I couldn't find any products matching your search.".to_string(),
                data: vec![],
            })),
        );

        assert!(!app.messages.iter().any(|m| matches!(m.body, MessageBody::Products(_))));
    }

    #[test]
    fn test_failure_surfaces_single_error_message() {
        let mut app = app();
        let loading_id = app.push_message(Role::Bot, MessageBody::Loading(String::new()));
        let before = app.messages.len();

        app.finish_chat(
            "hello",
            loading_id,
            Err(ApiError::Decode(serde_json::from_str::<u8>("x").unwrap_err())),
        );

        // Placeholder swapped for exactly one error notice
        assert_eq!(app.messages.len(), before);
        let texts = bot_texts(&app);
        assert!(texts.last().unwrap().contains("Is the backend running?"));
        assert!(app.history.is_empty());
    }

    #[test]
    fn test_locate_success_sets_location_and_summary() {
        let mut app = app();
        let loading_id = app.push_message(Role::Bot, MessageBody::Loading(String::new()));

        app.finish_locate(
            loading_id,
            Ok(Location {
                latitude: 12.9716,
                longitude: 77.5946,
                accuracy: 0.0,
                display_name: Some("MG Road, Bengaluru, Karnataka, India".to_string()),
            }),
        );

        assert!(app.location.is_some());
        assert!(bot_texts(&app).iter().any(|t| t.contains("Location set")));
    }

    #[test]
    fn test_locate_failure_leaves_location_unset() {
        let mut app = app();
        let loading_id = app.push_message(Role::Bot, MessageBody::Loading(String::new()));

        app.finish_locate(loading_id, Err(GeoError::Timeout));

        assert!(app.location.is_none());
        assert!(bot_texts(&app).iter().any(|t| t.contains("timed out")));
    }

    #[test]
    fn test_range_command_enforces_invariant() {
        let mut app = app();

        app.run_command("/range 20 20");

        assert_eq!(app.range.min(), 20);
        assert_eq!(app.range.max(), 21);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_clear_resets_history() {
        let mut app = app();
        app.history.push(HistoryEntry::user("a"));
        app.history.push(HistoryEntry::model("b"));

        app.run_command("/clear");

        assert!(app.history.is_empty());
        assert_eq!(bot_texts(&app), vec!["Chat cleared. How can I help you?"]);
    }

    #[test]
    fn test_unknown_command_reports_error() {
        let mut app = app();
        app.input = "/bogus".to_string();

        app.submit();

        assert!(!app.has_pending());
        assert!(bot_texts(&app).iter().any(|t| t.contains("Unknown command")));
    }

    #[test]
    fn test_last_bot_reply_skips_cards() {
        let mut app = app();
        app.push_bot_text("the reply");
        app.push_message(Role::Bot, MessageBody::Products(vec![]));
        app.push_message(Role::User, MessageBody::Text("user text".into()));

        assert_eq!(app.last_bot_reply(), Some("the reply"));
    }

    #[test]
    fn test_command_popup_filters() {
        let mut app = app();
        app.input = "/ra".to_string();

        assert!(app.showing_command_popup());
        let filtered = app.get_filtered_commands();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0, "/range");
    }

    #[test]
    fn test_command_selection_cycles() {
        let mut app = app();
        app.input = "/".to_string();
        let count = app.get_filtered_commands().len();

        app.command_select_down();
        assert_eq!(app.command_selection, Some(0));

        app.command_select_up();
        assert_eq!(app.command_selection, None);

        app.command_select_up();
        assert_eq!(app.command_selection, Some(count - 1));
    }
}
