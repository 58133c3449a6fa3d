//! Main application state and update loop

use eframe::egui;
use std::sync::{Arc, Mutex};

use dapp_connect_adapters::{ConnectConfig, ConnectionManager, PageHost};
use dapp_connect_core::{
    ChainFamily, ConnectionClient, EventName, Listener, ProviderEvent, RequestArguments, Session,
    WalletDescriptor,
};

use crate::client::DemoClient;
use crate::state::{active_account, sample_requests, DemoTab, EventLog, TAB_STORAGE_KEY};

type DemoManager = ConnectionManager<DemoClient, PageHost<DemoClient>>;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 212, 170);

/// Work handed to the background runtime.
#[derive(Debug, Clone)]
enum Action {
    Init,
    Connect(String),
    Request {
        family: ChainFamily,
        label: String,
        args: RequestArguments,
    },
    Disconnect,
}

/// Result from an async SDK call
#[derive(Debug, Clone)]
enum ActionResult {
    Initialized(&'static str),
    Connected(Session),
    Response { label: String, value: String },
    Disconnected,
    Failed { action: &'static str, error: String },
}

/// The main application state
pub struct App {
    active_tab: DemoTab,
    manager: Arc<DemoManager>,
    runtime: Option<Arc<tokio::runtime::Runtime>>,
    log: Arc<Mutex<EventLog>>,
    action_result: Arc<Mutex<Option<ActionResult>>>,
    busy: bool,
    listeners_attached: bool,
    wallets: Vec<WalletDescriptor>,
    selected_wallet: Option<String>,
    last_response: Option<(String, String)>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let stored_tab = cc.storage.and_then(|s| s.get_string(TAB_STORAGE_KEY));
        let active_tab = DemoTab::from_storage(stored_tab.as_deref());

        let config = ConnectConfig::from_env();
        let host = PageHost::new(user_agent());
        let manager = Arc::new(ConnectionManager::new(config, Arc::new(host)));

        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(rt) => Some(Arc::new(rt)),
            Err(e) => {
                tracing::error!("failed to start async runtime: {e}");
                None
            }
        };

        Self {
            active_tab,
            manager,
            runtime,
            log: Arc::new(Mutex::new(EventLog::default())),
            action_result: Arc::new(Mutex::new(None)),
            busy: false,
            listeners_attached: false,
            wallets: Vec::new(),
            selected_wallet: None,
            last_response: None,
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, action: Action) {
        let Some(runtime) = self.runtime.clone() else {
            self.log_line("app", "async runtime unavailable");
            return;
        };
        self.busy = true;
        let manager = Arc::clone(&self.manager);
        let result = Arc::clone(&self.action_result);
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let outcome = runtime.block_on(run_action(&manager, action));
            if let Ok(mut guard) = result.lock() {
                *guard = Some(outcome);
            }
            ctx.request_repaint();
        });
    }

    fn check_action_result(&mut self, ctx: &egui::Context) {
        let result = match self.action_result.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(result) = result else {
            return;
        };
        self.busy = false;

        match result {
            ActionResult::Initialized(client) => {
                self.attach_listeners(ctx);
                self.refresh_wallets();
                self.log_line("sdk", format!("initialized with {client}"));
            }
            ActionResult::Connected(session) => {
                let namespaces: Vec<&str> = session.namespaces.keys().map(String::as_str).collect();
                self.log_line(
                    "sdk",
                    format!("connected, namespaces: {}", namespaces.join(", ")),
                );
            }
            ActionResult::Response { label, value } => {
                self.log_line(self.active_tab.label(), format!("{label} resolved"));
                self.last_response = Some((label, value));
            }
            ActionResult::Disconnected => self.log_line("sdk", "disconnected"),
            ActionResult::Failed { action, error } => {
                tracing::warn!(action, "{error}");
                self.log_line("error", format!("{action}: {error}"));
            }
        }
    }

    /// Logs every provider event of every chain tab.
    fn attach_listeners(&mut self, ctx: &egui::Context) {
        if self.listeners_attached {
            return;
        }
        for tab in DemoTab::ALL {
            let Some(adapter) = self.manager.adapter(tab.family()) else {
                continue;
            };
            let log = Arc::clone(&self.log);
            let ctx = ctx.clone();
            let listener: Listener = Arc::new(move |event: &ProviderEvent| {
                if let Ok(mut log) = log.lock() {
                    log.push(
                        tab.label(),
                        format!("{}: {}", event.name(), event.payload()),
                    );
                }
                ctx.request_repaint();
            });
            for name in EventName::ALL {
                adapter.on(name.as_str(), Arc::clone(&listener));
            }
        }
        self.listeners_attached = true;
    }

    fn refresh_wallets(&mut self) {
        self.wallets = self.manager.supported_wallets();
        let still_listed = self
            .selected_wallet
            .as_ref()
            .is_some_and(|id| self.wallets.iter().any(|w| &w.id == id));
        if !still_listed {
            self.selected_wallet = self.wallets.first().map(|w| w.id.clone());
        }
    }

    fn log_line(&self, source: &str, message: impl Into<String>) {
        if let Ok(mut log) = self.log.lock() {
            log.push(source, message);
        }
    }

    /// Address of the first account the session holds for `tab`.
    fn account_for(&self, tab: DemoTab) -> Option<String> {
        let session = self.manager.client()?.session()?;
        active_account(&session, tab.family())
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new("OKX Connect").size(22.0).color(ACCENT));
                ui.add_space(30.0);
                ui.separator();
                ui.add_space(10.0);
                for tab in DemoTab::ALL {
                    ui.selectable_value(&mut self.active_tab, tab, tab.label());
                }
            });
            ui.add_space(4.0);
        });
    }

    fn render_footer(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!(
                        "dapp-connect v{} · {} · built {}",
                        env!("CARGO_PKG_VERSION"),
                        env!("GIT_HASH"),
                        env!("BUILD_TIME"),
                    ))
                    .small()
                    .weak(),
                );
            });
        });
    }

    fn render_connection(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let state = self.manager.state();
        let initialized = state.is_initialized();
        let connected = self.manager.is_connected();

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Platform:").strong());
            ui.label(format!("{:?}", self.manager.platform()));
            ui.add_space(16.0);
            ui.label(egui::RichText::new("State:").strong());
            ui.label(format!("{state:?}"));
            if let Some(client) = self.manager.client() {
                ui.add_space(16.0);
                ui.label(egui::RichText::new("Client:").strong());
                ui.label(client.label());
            }
            if self.busy {
                ui.spinner();
            }
        });
        ui.add_space(8.0);

        let mut pending = None;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!initialized && !self.busy, egui::Button::new("Init"))
                .clicked()
            {
                pending = Some(Action::Init);
            }

            let selected_name = self
                .selected_wallet
                .as_ref()
                .and_then(|id| self.wallets.iter().find(|w| &w.id == id))
                .map(|w| w.name.clone())
                .unwrap_or_else(|| "Select wallet".to_owned());
            ui.add_enabled_ui(initialized, |ui| {
                egui::ComboBox::from_id_salt("wallet_picker")
                    .selected_text(selected_name)
                    .show_ui(ui, |ui| {
                        for wallet in &self.wallets {
                            ui.selectable_value(
                                &mut self.selected_wallet,
                                Some(wallet.id.clone()),
                                wallet.name.as_str(),
                            );
                        }
                    });
            });

            let can_connect = initialized && !connected && !self.busy;
            if ui
                .add_enabled(can_connect, egui::Button::new("Connect"))
                .clicked()
            {
                if let Some(id) = self.selected_wallet.clone() {
                    pending = Some(Action::Connect(id));
                }
            }
            if self.active_tab == DemoTab::Evm
                && ui
                    .add_enabled(initialized && !self.busy, egui::Button::new("Request Accounts"))
                    .clicked()
            {
                pending = Some(Action::Request {
                    family: ChainFamily::Ethereum,
                    label: "Request Accounts".to_owned(),
                    args: RequestArguments::new("eth_requestAccounts"),
                });
            }
            if ui
                .add_enabled(connected && !self.busy, egui::Button::new("Disconnect"))
                .clicked()
            {
                pending = Some(Action::Disconnect);
            }
        });

        if let Some(account) = self.account_for(self.active_tab) {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Account:").strong());
                ui.monospace(&account);
                if ui.small_button("Copy").clicked() {
                    copy_to_clipboard(&account);
                }
            });
        }

        if let Some(action) = pending {
            self.dispatch(ctx, action);
        }
    }

    fn render_requests(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.add_space(10.0);
        ui.label(egui::RichText::new(format!("{} requests", self.active_tab.label())).strong());
        ui.separator();

        let connected = self.manager.is_connected();
        let account = self.account_for(self.active_tab).unwrap_or_default();
        let mut pending = None;
        ui.horizontal_wrapped(|ui| {
            for sample in sample_requests(self.active_tab, &account) {
                if ui
                    .add_enabled(connected && !self.busy, egui::Button::new(sample.label))
                    .clicked()
                {
                    pending = Some(Action::Request {
                        family: self.active_tab.family(),
                        label: sample.label.to_owned(),
                        args: sample.args,
                    });
                }
            }
        });
        if let Some(action) = pending {
            self.dispatch(ctx, action);
        }

        if let Some((label, value)) = &self.last_response {
            ui.add_space(8.0);
            ui.label(egui::RichText::new(label).strong());
            ui.add(
                egui::TextEdit::multiline(&mut value.as_str())
                    .code_editor()
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );
        }
    }

    fn render_event_log(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Events").strong());
            if ui.small_button("Clear").clicked() {
                if let Ok(mut log) = self.log.lock() {
                    log.clear();
                }
            }
        });
        ui.separator();

        let entries = self
            .log
            .lock()
            .map(|log| log.entries().to_vec())
            .unwrap_or_default();
        egui::ScrollArea::vertical()
            .max_height(260.0)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for entry in &entries {
                    ui.horizontal(|ui| {
                        ui.monospace(egui::RichText::new(&entry.timestamp).weak());
                        ui.monospace(egui::RichText::new(&entry.source).color(ACCENT));
                        ui.monospace(&entry.message);
                    });
                }
            });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.check_action_result(ctx);

        self.render_header(ctx);
        self.render_footer(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                self.render_connection(ui, ctx);
                self.render_requests(ui, ctx);
                self.render_event_log(ui);
                ui.add_space(20.0);
            });
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string(TAB_STORAGE_KEY, self.active_tab.storage_value().to_owned());
    }
}

async fn run_action(manager: &DemoManager, action: Action) -> ActionResult {
    match action {
        Action::Init => match manager.init().await {
            Ok(client) => ActionResult::Initialized(client.label()),
            Err(e) => failed("init", e),
        },
        Action::Connect(wallet_id) => match manager.connect(&wallet_id).await {
            Ok(session) => ActionResult::Connected(session),
            Err(e) => failed("connect", e),
        },
        Action::Request {
            family,
            label,
            args,
        } => {
            let Some(provider) = manager.provider(family) else {
                return ActionResult::Failed {
                    action: "request",
                    error: format!("no provider for {family}"),
                };
            };
            match provider.request(args).await {
                Ok(value) => ActionResult::Response {
                    label,
                    value: serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
                },
                Err(e) => failed("request", e),
            }
        }
        Action::Disconnect => match manager.disconnect().await {
            Ok(()) => ActionResult::Disconnected,
            Err(e) => failed("disconnect", e),
        },
    }
}

fn failed(action: &'static str, error: impl std::fmt::Display) -> ActionResult {
    ActionResult::Failed {
        action,
        error: error.to_string(),
    }
}

/// Simulated page user agent; `DAPP_CONNECT_USER_AGENT` overrides it to
/// preview the Telegram or mobile wallet list.
fn user_agent() -> String {
    std::env::var("DAPP_CONNECT_USER_AGENT").unwrap_or_else(|_| {
        format!(
            "Mozilla/5.0 ({}) dapp-connect-demo/{}",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION")
        )
    })
}

fn copy_to_clipboard(text: &str) {
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        let _ = clipboard.set_text(text);
    }
}
