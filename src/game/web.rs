//! Browser platform: DOM stage, `setInterval`/`requestAnimationFrame`
//! scheduler and the single thread-local session the UI callbacks talk to.
//!
//! Timer callbacks never capture the session. Each registration passes its
//! [`TimerId`] as the JS callback argument to one shared dispatcher closure,
//! which resolves the id against the scheduler and forwards it to
//! [`GameSession::on_timer`]. Cancelled ids resolve to nothing.

use std::cell::RefCell;
use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, Window, window};

use super::{GameSession, Phase, Platform, Stage, UiState};
use crate::audio::web::WebAudioEngine;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::jumpscare::canvas::CanvasSurface;
use crate::timer::{Fired, Scheduler, TimerEvent, TimerId};

pub struct WebPlatform;

impl Platform for WebPlatform {
    type Audio = WebAudioEngine;
    type Surface = CanvasSurface;
    type Scheduler = WebScheduler;
    type Stage = DomStage;
}

thread_local! {
    static SESSION: RefCell<Option<GameSession<WebPlatform>>> = const { RefCell::new(None) };
    static PENDING_CONFIG: RefCell<Option<GameConfig>> = const { RefCell::new(None) };
}

/// Run `f` against the live session. `None` before boot (or if re-entered).
pub fn with_session<T>(f: impl FnOnce(&mut GameSession<WebPlatform>) -> T) -> Option<T> {
    SESSION.with(|cell| match cell.try_borrow_mut() {
        Ok(mut guard) => guard.as_mut().map(f),
        Err(_) => {
            log::warn!("session busy, event dropped");
            None
        }
    })
}

pub fn is_booted() -> bool {
    SESSION.with(|cell| cell.borrow().is_some())
}

/// Store a config for the session created by [`boot`].
pub fn configure(json: &str) -> Result<(), GameError> {
    let cfg = GameConfig::from_json(json)?;
    if is_booted() {
        return Err(GameError::AlreadyBooted);
    }
    PENDING_CONFIG.with(|cell| cell.replace(Some(cfg)));
    Ok(())
}

/// Build the session against the page and wire the UI. Idempotent.
pub fn boot() -> Result<(), GameError> {
    if is_booted() {
        return Ok(());
    }
    let win = window().ok_or(GameError::NoWindow)?;
    let doc = win.document().ok_or(GameError::NoDocument)?;
    let config = PENDING_CONFIG.with(|cell| cell.borrow_mut().take()).unwrap_or_default();

    let seed = random_seed(&win);
    let audio = WebAudioEngine::new(config.master_gain, SmallRng::seed_from_u64(seed.rotate_left(17)));
    let mut surface = CanvasSurface::attach(&doc)?;
    crate::jumpscare::DrawSurface::resize_to_display(&mut surface);
    let stage = DomStage::attach(&doc)?;
    let scheduler = WebScheduler::new(win.clone());

    let session = GameSession::<WebPlatform>::create(config, audio, surface, scheduler, stage, seed);
    SESSION.with(|cell| cell.replace(Some(session)));
    bind_ui(&win, &doc)?;
    log::info!("session ready");
    Ok(())
}

fn random_seed(win: &Window) -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            log::warn!("getrandom failed ({err}), seeding from clock");
            win.performance().map(|p| p.now().to_bits()).unwrap_or(0x5eed)
        }
    }
}

// --- UI wiring ------------------------------------------------------------------

fn bind_ui(win: &Window, doc: &Document) -> Result<(), GameError> {
    on_click(doc, "startBtn", GameSession::start)?;
    on_click(doc, "key", GameSession::collect_key)?;
    on_click(doc, "door", GameSession::attempt_exit)?;
    on_click(doc, "restart", GameSession::restart)?;
    on_click(doc, "mute", GameSession::toggle_mute)?;
    on_click(doc, "skip", GameSession::skip)?;

    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
        with_session(GameSession::resize_surface);
    }) as Box<dyn FnMut(_)>);
    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn on_click(doc: &Document, id: &str, action: fn(&mut GameSession<WebPlatform>)) -> Result<(), GameError> {
    let el = element(doc, id, "button")?;
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
        with_session(action);
    }) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn element(doc: &Document, id: &str, tag: &str) -> Result<HtmlElement, GameError> {
    let el = match doc.get_element_by_id(id) {
        Some(el) => el,
        None => {
            log::warn!("#{id} not found, creating a <{tag}>");
            let el = doc.create_element(tag)?;
            el.set_id(id);
            doc.body().ok_or(GameError::NoDocument)?.append_child(&el)?;
            el
        }
    };
    el.dyn_into::<HtmlElement>()
        .map_err(|_| GameError::MissingElement(id.to_string()))
}

// --- Scheduler ------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
enum Handle {
    Interval(i32),
    Timeout(i32),
    Frame(i32),
}

pub struct WebScheduler {
    window: Window,
    next_id: u32,
    live: HashMap<TimerId, (Handle, TimerEvent)>,
    on_timer: Closure<dyn FnMut(JsValue)>,
    on_frame: Closure<dyn FnMut(f64)>,
}

impl WebScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            next_id: 0,
            live: HashMap::new(),
            on_timer: Closure::wrap(Box::new(dispatch_timer) as Box<dyn FnMut(JsValue)>),
            on_frame: Closure::wrap(Box::new(dispatch_frame) as Box<dyn FnMut(f64)>),
        }
    }

    fn issue(&mut self) -> TimerId {
        self.next_id = self.next_id.wrapping_add(1);
        TimerId(self.next_id)
    }

    /// The registration behind a fired id; one-shots are forgotten here.
    pub fn resolve(&mut self, id: TimerId) -> Option<Fired> {
        let (handle, event) = *self.live.get(&id)?;
        if !matches!(handle, Handle::Interval(_)) {
            self.live.remove(&id);
        }
        Some(Fired { id, event })
    }

    /// All outstanding frame requests (they share one refresh).
    pub fn take_frames(&mut self) -> Vec<TimerId> {
        let ids: Vec<TimerId> = self
            .live
            .iter()
            .filter(|(_, (h, _))| matches!(h, Handle::Frame(_)))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.live.remove(id);
        }
        ids
    }

    fn register(&mut self, handle: Result<i32, JsValue>, wrap: fn(i32) -> Handle, event: TimerEvent, id: TimerId) {
        match handle {
            Ok(h) => {
                self.live.insert(id, (wrap(h), event));
            }
            Err(e) => log::warn!("failed to register {event:?}: {e:?}"),
        }
    }
}

impl Scheduler for WebScheduler {
    fn now_ms(&self) -> f64 {
        self.window.performance().map(|p| p.now()).unwrap_or(0.0)
    }

    fn set_interval(&mut self, period_ms: u32, event: TimerEvent) -> TimerId {
        let id = self.issue();
        let handle = self.window.set_interval_with_callback_and_timeout_and_arguments_1(
            self.on_timer.as_ref().unchecked_ref(),
            period_ms as i32,
            &JsValue::from(id.0),
        );
        self.register(handle, Handle::Interval, event, id);
        id
    }

    fn set_timeout(&mut self, delay_ms: u32, event: TimerEvent) -> TimerId {
        let id = self.issue();
        let handle = self.window.set_timeout_with_callback_and_timeout_and_arguments_1(
            self.on_timer.as_ref().unchecked_ref(),
            delay_ms as i32,
            &JsValue::from(id.0),
        );
        self.register(handle, Handle::Timeout, event, id);
        id
    }

    fn request_frame(&mut self) -> TimerId {
        let id = self.issue();
        let handle = self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref());
        self.register(handle, Handle::Frame, TimerEvent::AnimationFrame, id);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        let Some((handle, _)) = self.live.remove(&id) else {
            return;
        };
        match handle {
            Handle::Interval(h) => self.window.clear_interval_with_handle(h),
            Handle::Timeout(h) => self.window.clear_timeout_with_handle(h),
            Handle::Frame(h) => {
                let _ = self.window.cancel_animation_frame(h);
            }
        }
    }
}

fn dispatch_timer(raw: JsValue) {
    let Some(raw) = raw.as_f64() else {
        return;
    };
    let id = TimerId(raw as u32);
    with_session(|s| {
        if let Some(fired) = s.scheduler_mut().resolve(id) {
            s.on_timer(fired);
        }
    });
}

fn dispatch_frame(_ts: f64) {
    with_session(|s| {
        for id in s.scheduler_mut().take_frames() {
            s.on_timer(Fired { id, event: TimerEvent::AnimationFrame });
        }
    });
}

// --- DOM stage ------------------------------------------------------------------

pub struct DomStage {
    room: HtmlElement,
    key: HtmlElement,
    door: HtmlElement,
    ghost: HtmlElement,
    splash: HtmlElement,
    overlay: HtmlElement,
    level_label: HtmlElement,
    timer_label: HtmlElement,
    message: HtmlElement,
    mute_button: HtmlElement,
}

impl DomStage {
    pub fn attach(doc: &Document) -> Result<Self, GameError> {
        Ok(Self {
            room: element(doc, "room", "div")?,
            key: element(doc, "key", "div")?,
            door: element(doc, "door", "div")?,
            ghost: element(doc, "ghost", "div")?,
            splash: element(doc, "splash", "div")?,
            overlay: element(doc, "uiOverlay", "div")?,
            level_label: element(doc, "level", "span")?,
            timer_label: element(doc, "timer", "span")?,
            message: element(doc, "message", "div")?,
            mute_button: element(doc, "mute", "button")?,
        })
    }
}

fn set_hidden(el: &HtmlElement, hidden: bool) {
    let classes = el.class_list();
    let _ = if hidden {
        classes.add_1("hidden")
    } else {
        classes.remove_1("hidden")
    };
}

fn place(el: &HtmlElement, x: f64, y: f64) {
    let style = el.style();
    style.set_property("left", &format!("{x}px")).ok();
    style.set_property("top", &format!("{y}px")).ok();
}

impl Stage for DomStage {
    fn room_size(&self) -> (f64, f64) {
        let rect = self.room.get_bounding_client_rect();
        (rect.width(), rect.height())
    }

    fn place_key(&mut self, x: f64, y: f64) {
        place(&self.key, x, y);
    }

    fn set_key_visible(&mut self, visible: bool) {
        set_hidden(&self.key, !visible);
    }

    fn set_door_visible(&mut self, visible: bool) {
        set_hidden(&self.door, !visible);
    }

    fn place_ghost(&mut self, x: f64, y: f64) {
        place(&self.ghost, x, y);
    }

    fn set_ghost_visible(&mut self, visible: bool) {
        set_hidden(&self.ghost, !visible);
    }

    fn on_phase_change(&mut self, phase: Phase) {
        let pointer = match phase {
            Phase::Idle => {
                set_hidden(&self.splash, false);
                set_hidden(&self.overlay, true);
                return;
            }
            Phase::LevelActive => "none",
            Phase::LevelFailed | Phase::GameWon => "auto",
        };
        set_hidden(&self.splash, true);
        set_hidden(&self.overlay, false);
        self.overlay.style().set_property("pointer-events", pointer).ok();
    }

    fn render_hud(&mut self, ui: &UiState) {
        self.level_label.set_text_content(Some(&ui.level_label));
        self.timer_label.set_text_content(Some(&ui.timer_label));
        self.message.set_text_content(Some(&ui.message));
        self.mute_button.set_text_content(Some(&ui.mute_label));
    }
}
