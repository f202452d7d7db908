use anyhow::Result;
use couch_input::engine::input::{
    ActionRegistry, DeviceId, DeviceSession, InputConfig, VirtualBackend,
};
use couch_input::engine::players::{PlayerEvent, PlayerManager};
use log::info;
use std::collections::BTreeMap;
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

const CONFIG_PATH: &str = "config/input.toml";

/// F1-F4 attach/detach virtual joypads 0-3
const PAD_TOGGLE_KEYS: [KeyCode; 4] = [KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4];

/// 1-4 hold button 0 on virtual joypads 0-3
const PAD_BUTTON_KEYS: [KeyCode; 4] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
];

/// Couch lobby: devices join with "join", leave with "leave", anyone starts with "start"
struct Lobby {
    registry: ActionRegistry<VirtualBackend>,
    players: PlayerManager,
    sessions: BTreeMap<usize, DeviceSession>,
}

impl Lobby {
    fn new(config: InputConfig) -> Self {
        let mut players = PlayerManager::new(config.max_players);
        players.subscribe(|event| match event {
            PlayerEvent::Joined(player) => info!("Spawning player {}", player + 1),
            PlayerEvent::Left(player) => info!("Despawning player {}", player + 1),
        });

        Self {
            registry: ActionRegistry::initialize(config.catalog, VirtualBackend::new()),
            players,
            sessions: BTreeMap::new(),
        }
    }

    fn process_keyboard_event(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let backend = self.registry.source_mut();

        if let Some(index) = PAD_TOGGLE_KEYS.iter().position(|k| *k == code) {
            if event.state == ElementState::Pressed && !event.repeat {
                let device = DeviceId::joypad(index as u16);
                if backend.is_connected(device) {
                    backend.disconnect_joypad(device);
                } else {
                    backend.connect_joypad(
                        index as u16,
                        &format!("virtual-pad-{index}"),
                        &format!("Virtual Pad {}", index + 1),
                    );
                }
            }
        } else if let Some(index) = PAD_BUTTON_KEYS.iter().position(|k| *k == code) {
            let device = DeviceId::joypad(index as u16);
            match event.state {
                ElementState::Pressed => backend.press_button(device, 0),
                ElementState::Released => backend.release_button(device, 0),
            }
        } else {
            backend.process_keyboard_event(event);
        }
    }

    fn tick(&mut self) {
        self.registry.update();

        for player in self.players.handle_join_input(&self.registry, "join") {
            if let Ok(device) = self.players.player_device(player) {
                let session = DeviceSession::bind(device, &mut self.registry);
                session.start_vibration(&mut self.registry, 0.3, 0.6, 0.2);
                info!(
                    "Player {} plays on {}",
                    player + 1,
                    session.name(&self.registry)
                );
                self.sessions.insert(player, session);
            }
        }

        let leaving: Vec<usize> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.just_pressed(&self.registry, "leave", false))
            .map(|(player, _)| *player)
            .collect();
        for player in leaving {
            self.sessions.remove(&player);
            self.players.leave(player);
        }

        for (player, session) in &self.sessions {
            if session.just_pressed(&self.registry, "jump", false) {
                info!("Player {} jumps", player + 1);
            }
        }

        if self.players.any_player_just_pressed(&self.registry, "start") {
            info!(
                "Starting match with players {:?}",
                self.players.joined_players()
            );
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting couch-input lobby...");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = InputConfig::load_or_builtin(&config_path)?;
    let mut lobby = Lobby::new(config);

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("couch-input lobby")
        .with_inner_size(winit::dpi::LogicalSize::new(640, 360))
        .with_resizable(true)
        .build(&event_loop)?;

    info!("F1-F4 attach/detach virtual pads, 1-4 press their first button");

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                info!("Close requested, shutting down...");
                elwt.exit();
            }
            Event::WindowEvent {
                event: WindowEvent::KeyboardInput { event, .. },
                ..
            } => lobby.process_keyboard_event(&event),
            Event::WindowEvent {
                event: WindowEvent::ModifiersChanged(modifiers),
                ..
            } => lobby.registry.source_mut().set_modifiers(modifiers.state()),
            Event::WindowEvent {
                event: WindowEvent::MouseInput { state, button, .. },
                ..
            } => lobby
                .registry
                .source_mut()
                .process_mouse_button(state, button),
            Event::AboutToWait => {
                lobby.tick();
                window.request_redraw();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
