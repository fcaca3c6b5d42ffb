//! Dino Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::{Result, anyhow};
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlInputElement};

    use dino_dash::consts::*;
    use dino_dash::input::{ActivateBinding, CheatDetector};
    use dino_dash::leaderboard::{ScoreEntry, ScoreService, reduce_to_top_per_player};
    use dino_dash::profile::{LocalStorageStore, ProfileBook, validate_player_name};
    use dino_dash::schedule::FrameScheduler;
    use dino_dash::sim::{ControlMode, GamePhase, GameState, TickInput, tick};
    use dino_dash::store::{LeaderboardStore, MemoryLeaderboard, RestLeaderboard};
    use dino_dash::Settings;

    /// Logical key for the activate signal
    const ACTIVATE_KEY: &str = " ";
    /// Rows shown in the leaderboard panel
    const LEADERBOARD_LIMIT: usize = 50;

    type Service = ScoreService<LocalStorageStore>;

    /// Everything a run was submitted with, kept for the retry control
    #[derive(Clone)]
    struct LastRun {
        name: String,
        score: u32,
        speed: f32,
        obstacles_avoided: u32,
        ended_ms: f64,
    }

    /// Game driver holding session and shell state
    struct Game {
        state: GameState,
        input: TickInput,
        player_name: Option<String>,
        local_high_score: u32,
        settings: Settings,
        last_run: Option<LastRun>,
    }

    impl Game {
        fn new(seed: u64, settings: Settings) -> Self {
            Self {
                state: GameState::new(seed),
                input: TickInput::default(),
                player_name: None,
                local_high_score: 0,
                settings,
                last_run: None,
            }
        }

        /// Begin a run if one can begin
        fn activate(&mut self) {
            match self.state.phase {
                GamePhase::Ready if self.player_name.is_some() => self.state.start(),
                GamePhase::Running => self.input.activate = true,
                _ => {}
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Dino Dash starting...");

        let settings = Settings::load();
        let remote: Rc<dyn LeaderboardStore> = match settings.remote_url.as_deref() {
            Some(url) => {
                log::info!("Using leaderboard backend at {}", url);
                Rc::new(RestLeaderboard::new(url))
            }
            None => {
                log::warn!("No leaderboard backend configured; scores stay on this device");
                Rc::new(MemoryLeaderboard::new())
            }
        };
        let service = Rc::new(Service::new(LocalStorageStore, remote));

        let seed = js_sys::Date::now() as u64;
        let hover = settings.hover_unlocked;
        let game = Rc::new(RefCell::new(Game::new(seed, settings)));
        log::info!("Game initialized with seed: {}", seed);

        if let Err(err) = setup(game.clone(), service.clone(), hover) {
            log::error!("Failed to set up the page: {}", err);
        }
    }

    fn setup(game: Rc<RefCell<Game>>, service: Rc<Service>, hover: bool) -> Result<()> {
        let bindings: Rc<RefCell<Option<ActivateBinding>>> = Rc::new(RefCell::new(None));

        rebind_controls(&bindings, game.clone(), hover)?;
        if hover {
            game.borrow_mut().state.control_mode = ControlMode::Hover;
        }

        setup_name_form(game.clone())?;
        setup_replay_button(game.clone())?;
        setup_warning_controls(game.clone(), service.clone())?;
        setup_cheat_handler(game.clone(), bindings)?;
        setup_leaderboard_feed(service.clone())?;

        // The scheduler handle lives for the page lifetime
        let scheduler = FrameScheduler::run(
            frame_callback(game, service),
            TICK_INTERVAL_MS,
        )?;
        std::mem::forget(scheduler);

        log::info!("Dino Dash running!");
        Ok(())
    }

    /// One accepted tick: advance the sim, then mirror state to the HUD
    /// and hand a finished run to the aggregator.
    fn frame_callback(
        game: Rc<RefCell<Game>>,
        service: Rc<Service>,
    ) -> impl FnMut(f64) + 'static {
        move |time: f64| {
            let finished = {
                let mut g = game.borrow_mut();
                let input = g.input;
                tick(&mut g.state, &input, time);
                g.input = TickInput::default();

                let finished = g.state.take_final_score(time).and_then(|score| {
                    g.player_name.clone().map(|name| LastRun {
                        name,
                        score,
                        speed: g.state.speed,
                        obstacles_avoided: g.state.obstacles_avoided,
                        ended_ms: time,
                    })
                });
                if let Some(run) = &finished {
                    g.last_run = Some(run.clone());
                }
                update_hud(&g);
                finished
            };

            if let Some(run) = finished {
                submit_run(game.clone(), service.clone(), run);
            }
        }
    }

    /// Submit a finished run; the sim keeps running while this is in flight
    fn submit_run(game: Rc<RefCell<Game>>, service: Rc<Service>, run: LastRun) {
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = service
                .submit(
                    &run.name,
                    run.score,
                    run.speed,
                    run.obstacles_avoided,
                    run.ended_ms,
                    &today_string(),
                )
                .await;

            match outcome {
                Ok(outcome) => {
                    game.borrow_mut().local_high_score = outcome.profile.high_score;
                    match outcome.warning {
                        Some(warning) => show_warning(&warning.to_string()),
                        None => hide_warning(),
                    }
                    refresh_stats_panel(service.clone(), run.name.clone()).await;
                }
                Err(err) => {
                    // Unreachable through the form's validation, but never fatal
                    log::error!("Score submission rejected: {}", err);
                }
            }
        });
    }

    fn rebind_controls(
        bindings: &Rc<RefCell<Option<ActivateBinding>>>,
        game: Rc<RefCell<Game>>,
        hover: bool,
    ) -> Result<()> {
        // Dropping the old binding detaches its listeners, so the
        // momentary and toggle bindings are never attached together
        bindings.borrow_mut().take();

        let on_activate = move || game.borrow_mut().activate();
        let binding = if hover {
            ActivateBinding::bind_hover(ACTIVATE_KEY, true, on_activate)?
                .expect("hover binding requested with hover enabled")
        } else {
            ActivateBinding::bind(ACTIVATE_KEY, on_activate)?
        };
        *bindings.borrow_mut() = Some(binding);
        Ok(())
    }

    fn setup_name_form(game: Rc<RefCell<Game>>) -> Result<()> {
        let Some(button) = document()?.get_element_by_id("start-btn") else {
            return Ok(());
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let document = match document() {
                Ok(d) => d,
                Err(_) => return,
            };
            let Some(input) = document
                .get_element_by_id("player-name")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };

            match validate_player_name(&input.value()) {
                Ok(name) => {
                    log::info!("Player {} checked in", name);
                    let mut g = game.borrow_mut();
                    g.local_high_score = ProfileBook::load(&LocalStorageStore)
                        .high_score_for(&name)
                        .unwrap_or(0);
                    g.player_name = Some(name);
                    g.state.start();
                    set_class(&document, "name-form", "hidden");
                    set_class(&document, "hud", "");
                }
                Err(err) => {
                    log::warn!("Rejected player name: {}", err);
                    set_class(&document, "name-error", "");
                }
            }
        });
        button
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("click listener failed: {:?}", err))?;
        closure.forget();
        Ok(())
    }

    fn setup_replay_button(game: Rc<RefCell<Game>>) -> Result<()> {
        let document = document()?;
        let Some(button) = document.get_element_by_id("replay-btn") else {
            return Ok(());
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let mut g = game.borrow_mut();
            g.state.replay();
            if g.state.phase == GamePhase::Ready {
                g.state.start();
                log::info!("Replay started");
            }
        });
        button
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("click listener failed: {:?}", err))?;
        closure.forget();
        Ok(())
    }

    fn setup_warning_controls(game: Rc<RefCell<Game>>, service: Rc<Service>) -> Result<()> {
        let document = document()?;

        if let Some(button) = document.get_element_by_id("warning-dismiss-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                hide_warning();
            });
            button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                .map_err(|err| anyhow!("click listener failed: {:?}", err))?;
            closure.forget();
        }

        if let Some(button) = document.get_element_by_id("warning-retry-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let last_run = game.borrow().last_run.clone();
                if let Some(run) = last_run {
                    log::info!("Retrying submission for {}", run.name);
                    hide_warning();
                    submit_run(game.clone(), service.clone(), run);
                }
            });
            button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                .map_err(|err| anyhow!("click listener failed: {:?}", err))?;
            closure.forget();
        }

        Ok(())
    }

    /// A burst of pointer presses unlocks hover mode
    fn setup_cheat_handler(
        game: Rc<RefCell<Game>>,
        bindings: Rc<RefCell<Option<ActivateBinding>>>,
    ) -> Result<()> {
        let document = document()?;
        let detector = Rc::new(RefCell::new(CheatDetector::default()));

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
            let now = js_sys::Date::now();
            if !detector.borrow_mut().register_press(now) {
                return;
            }

            let hover = {
                let mut g = game.borrow_mut();
                let hover = g.state.control_mode != ControlMode::Hover;
                g.state.control_mode = if hover {
                    ControlMode::Hover
                } else {
                    ControlMode::Jump
                };
                g.settings.hover_unlocked = hover;
                g.settings.save();
                hover
            };
            log::info!("Hover mode {}", if hover { "enabled" } else { "disabled" });
            if let Err(err) = rebind_controls(&bindings, game.clone(), hover) {
                log::error!("Failed to swap control bindings: {}", err);
            }
        });
        document
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("pointerdown listener failed: {:?}", err))?;
        closure.forget();
        Ok(())
    }

    /// Keep the leaderboard panel in sync with the shared store
    fn setup_leaderboard_feed(service: Rc<Service>) -> Result<()> {
        let subscription = service
            .remote()
            .subscribe(
                LEADERBOARD_LIMIT,
                Box::new(|raw: Vec<ScoreEntry>| {
                    let top = reduce_to_top_per_player(&raw, LEADERBOARD_LIMIT);
                    if let Err(err) = render_leaderboard(&top) {
                        log::warn!("Leaderboard render failed: {}", err);
                    }
                }),
            );

        match subscription {
            Ok(subscription) => {
                // Page-lifetime subscription
                std::mem::forget(subscription);
            }
            Err(err) => {
                log::warn!("Leaderboard subscription unavailable: {}", err);
                show_warning(&format!("Leaderboard unavailable: {}", err));
            }
        }
        Ok(())
    }

    /// Mirror the session snapshot into the HUD elements
    fn update_hud(game: &Game) {
        let Ok(document) = document() else {
            return;
        };

        set_text(&document, "hud-score", &game.state.score.to_string());
        set_text(&document, "hud-high-score", &game.local_high_score.to_string());
        if game.settings.show_speed {
            set_text(&document, "hud-speed", &format!("{:.1}", game.state.speed));
        }

        match game.state.phase {
            GamePhase::Ended { .. } => {
                set_text(&document, "final-score", &game.state.score.to_string());
                set_class(&document, "game-over", "");
                let new_best = game.state.score >= game.local_high_score && game.state.score > 0;
                set_class(
                    &document,
                    "new-high-score",
                    if new_best { "" } else { "hidden" },
                );
            }
            _ => set_class(&document, "game-over", "hidden"),
        }
    }

    fn render_leaderboard(entries: &[ScoreEntry]) -> Result<()> {
        let document = document()?;
        let Some(list) = document.get_element_by_id("leaderboard-list") else {
            return Ok(());
        };
        list.set_inner_html("");

        for (rank, entry) in entries.iter().enumerate() {
            let row = document
                .create_element("div")
                .map_err(|err| anyhow!("create row failed: {:?}", err))?;
            row.set_class_name("leaderboard-item");
            row.set_text_content(Some(&format!(
                "#{} {} - {} (speed {:.1})",
                rank + 1,
                entry.player_name,
                entry.score,
                entry.speed
            )));
            list.append_child(&row)
                .map_err(|err| anyhow!("append row failed: {:?}", err))?;
        }
        Ok(())
    }

    async fn refresh_stats_panel(service: Rc<Service>, player: String) {
        match service.player_stats(&player).await {
            Ok(Some(stats)) => {
                let Ok(document) = document() else {
                    return;
                };
                set_text(&document, "stat-high-score", &stats.high_score.to_string());
                set_text(&document, "stat-games", &stats.total_games.to_string());
                set_text(&document, "stat-average", &stats.average_score.to_string());
                set_text(&document, "stat-best-speed", &format!("{:.1}", stats.best_speed));
                set_class(&document, "player-stats", "");
            }
            Ok(None) => {}
            Err(err) => log::warn!("Stats fetch failed for {}: {}", player, err),
        }
    }

    fn show_warning(message: &str) {
        if let Ok(document) = document() {
            set_text(&document, "store-warning-text", message);
            set_class(&document, "store-warning", "");
        }
    }

    fn hide_warning() {
        if let Ok(document) = document() {
            set_class(&document, "store-warning", "hidden");
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(document: &Document, id: &str, class: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", class);
        }
    }

    fn document() -> Result<Document> {
        web_sys::window()
            .ok_or_else(|| anyhow!("no window"))?
            .document()
            .ok_or_else(|| anyhow!("no document"))
    }

    /// Today's date for the profile record, e.g. "8/7/2026"
    fn today_string() -> String {
        let date = js_sys::Date::new_0();
        format!(
            "{}/{}/{}",
            date.get_month() + 1,
            date.get_date(),
            date.get_full_year()
        )
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dino Dash (native) starting...");
    log::info!("Native mode has no display - run with `trunk serve` for the web version");

    smoke_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless smoke run: drive the sim until the first collision and push
/// the result through the full submission path against in-memory stores.
#[cfg(not(target_arch = "wasm32"))]
fn smoke_run() {
    use std::rc::Rc;

    use dino_dash::consts::TICK_INTERVAL_MS;
    use dino_dash::leaderboard::ScoreService;
    use dino_dash::profile::MemoryStore;
    use dino_dash::sim::{GamePhase, GameState, TickInput, tick};
    use dino_dash::store::MemoryLeaderboard;

    let mut state = GameState::new(0xD1_0D05);
    state.start();

    let mut now = 0.0;
    while state.phase == GamePhase::Running && state.time_ticks < 100_000 {
        now += TICK_INTERVAL_MS;
        tick(&mut state, &TickInput::default(), now);
    }
    println!(
        "Run ended at score {} (speed {:.1}, {} obstacles avoided)",
        state.score, state.speed, state.obstacles_avoided
    );

    let service = ScoreService::new(MemoryStore::new(), Rc::new(MemoryLeaderboard::new()));
    let outcome = futures::executor::block_on(service.submit(
        "Smoke",
        state.score,
        state.speed,
        state.obstacles_avoided,
        now,
        "today",
    ))
    .expect("smoke submission");
    println!(
        "Submitted: high score {} (warning: {:?})",
        outcome.profile.high_score,
        outcome.warning.map(|w| w.to_string())
    );
}
