use arboard::Clipboard;
use gridchase::logging::init_logging;
use gridchase::{Cell, Config, Direction, Episode, EpisodeSettings, GenerationError, Outcome, Role};
use macroquad::prelude::*;
use ::rand::Rng;
use tracing::{error, info, warn};

/// Upper bound on simulation ticks run in a single frame after a stall
const MAX_TICKS_PER_FRAME: u32 = 5;
/// Frames in one facing-indicator animation cycle
const ANIM_FRAMES: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Start,
    Playing,
    Finished,
}

/// Presentation state wrapped around one episode
struct GameView {
    settings: EpisodeSettings,
    episode: Episode,
    seed: u64,
    screen: Screen,
    cell_size: f32,
    tick_interval: f32,
    accumulator: f32,
    anim_delay: u32,
    anim_counter: u32,
    anim_frame: u32,
}

impl GameView {
    fn new(config: &Config) -> Result<Self, GenerationError> {
        let settings = config.episode_settings();
        let seed = config
            .map
            .seed
            .unwrap_or_else(|| ::rand::thread_rng().gen());
        let episode = Episode::new(&settings, seed)?;

        Ok(GameView {
            settings,
            episode,
            seed,
            screen: Screen::Start,
            cell_size: config.grid.cell_size,
            tick_interval: 1.0 / config.game.tick_rate.max(1) as f32,
            accumulator: 0.0,
            anim_delay: config.visual.anim_delay.max(1),
            anim_counter: 0,
            anim_frame: 0,
        })
    }

    /// Start over on a fresh map from the next seed
    fn restart(&mut self) -> Result<(), GenerationError> {
        self.seed = self.seed.wrapping_add(1);
        self.episode = Episode::new(&self.settings, self.seed)?;
        self.screen = Screen::Playing;
        self.accumulator = 0.0;
        Ok(())
    }

    /// Arrow keys, first match wins: left, right, up, down
    fn read_intent() -> Option<Direction> {
        if is_key_down(KeyCode::Left) {
            Some(Direction::Left)
        } else if is_key_down(KeyCode::Right) {
            Some(Direction::Right)
        } else if is_key_down(KeyCode::Up) {
            Some(Direction::Up)
        } else if is_key_down(KeyCode::Down) {
            Some(Direction::Down)
        } else {
            None
        }
    }

    fn update(&mut self, frame_time: f32) {
        self.anim_counter += 1;
        if self.anim_counter >= self.anim_delay {
            self.anim_frame = (self.anim_frame + 1) % ANIM_FRAMES;
            self.anim_counter = 0;
        }

        if self.screen != Screen::Playing {
            return;
        }

        self.accumulator += frame_time;
        let mut ticks = 0;
        while self.accumulator >= self.tick_interval && ticks < MAX_TICKS_PER_FRAME {
            self.accumulator -= self.tick_interval;
            ticks += 1;

            let outcome = self.episode.tick(Self::read_intent());
            if outcome.is_terminal() {
                info!(outcome = ?outcome, seed = self.seed, "round over");
                self.screen = Screen::Finished;
                self.accumulator = 0.0;
                break;
            }
        }
        if ticks == MAX_TICKS_PER_FRAME {
            self.accumulator = 0.0;
        }
    }

    fn copy_to_clipboard(&self) {
        let layout = self.episode.grid().to_layout();
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(layout) {
                    warn!(error = %e, "failed to copy to clipboard");
                } else {
                    info!("map layout copied to clipboard");
                    // Keep clipboard alive for a moment to ensure clipboard managers can capture it
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to access clipboard");
            }
        }
    }

    fn cell_origin(&self, cell: Cell) -> (f32, f32) {
        (cell.col as f32 * self.cell_size, cell.row as f32 * self.cell_size)
    }

    fn draw_tile(&self, cell: Cell, color: Color) {
        let (px, py) = self.cell_origin(cell);
        draw_rectangle(px, py, self.cell_size - 1.0, self.cell_size - 1.0, color);
    }

    /// Body square plus a triangle on the facing side that bobs with the animation frame
    fn draw_agent(&self, cell: Cell, facing: Direction, color: Color) {
        let (px, py) = self.cell_origin(cell);
        let size = self.cell_size;
        let inset = size * 0.15;
        draw_rectangle(px + inset, py + inset, size - 2.0 * inset, size - 2.0 * inset, color);

        let bob = self.anim_frame as f32 * size * 0.03;
        let cx = px + size / 2.0;
        let cy = py + size / 2.0;
        let (dx, dy) = facing.delta();
        let (dx, dy) = (dx as f32, dy as f32);
        let reach = size * 0.3 + bob;
        let tip = vec2(cx + dx * reach, cy + dy * reach);
        let side = vec2(-dy, dx) * (size * 0.12);
        let base = vec2(cx + dx * size * 0.1, cy + dy * size * 0.1);
        draw_triangle(tip, base + side, base - side, WHITE);
    }

    fn draw(&self) {
        clear_background(BLACK);

        let grid = self.episode.grid();
        for cell in grid.cells() {
            let color = if grid.is_blocked(cell) {
                Color::from_rgba(70, 50, 40, 255)
            } else {
                Color::from_rgba(60, 60, 60, 255)
            };
            self.draw_tile(cell, color);
        }

        self.draw_tile(self.episode.goal(), YELLOW);

        for agent in self.episode.agents() {
            let color = match agent.role {
                Role::Racer => ORANGE,
                _ => RED,
            };
            self.draw_agent(agent.position, agent.facing, color);
        }

        let player = self.episode.player();
        self.draw_agent(player.position, player.facing, BLUE);

        match self.screen {
            Screen::Start => self.draw_banner("Press ENTER to start"),
            Screen::Playing => {}
            Screen::Finished => {
                let message = match self.episode.outcome() {
                    Outcome::Escaped => "You escaped! R: play again",
                    Outcome::Caught => "You were caught! R: play again",
                    Outcome::AgentWon => "The racer won! R: play again",
                    Outcome::Running => "",
                };
                self.draw_banner(message);
            }
        }

        let info = format!(
            "Seed: {}  Tick: {}  C: copy map  Esc: quit",
            self.seed,
            self.episode.ticks()
        );
        draw_text(&info, 10.0, screen_height() - 10.0, 20.0, WHITE);
    }

    fn draw_banner(&self, message: &str) {
        let font_size = 40.0;
        let dims = measure_text(message, None, font_size as u16, 1.0);
        let x = (screen_width() - dims.width) / 2.0;
        let y = screen_height() / 2.0;
        draw_rectangle(0.0, y - dims.height - 16.0, screen_width(), dims.height + 32.0, Color::from_rgba(0, 0, 0, 200));
        draw_text(message, x, y, font_size, WHITE);
    }
}

fn window_conf() -> Conf {
    let config = Config::load();
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: (config.grid.cols as f32 * config.grid.cell_size) as i32,
        window_height: (config.grid.rows as f32 * config.grid.cell_size) as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = Config::load();
    init_logging(&config.logging.filter);

    let mut view = match GameView::new(&config) {
        Ok(view) => view,
        Err(e) => {
            error!(error = %e, "could not start episode");
            return;
        }
    };

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        match view.screen {
            Screen::Start => {
                if is_key_pressed(KeyCode::Enter) {
                    view.screen = Screen::Playing;
                }
            }
            Screen::Playing => {}
            Screen::Finished => {
                if is_key_pressed(KeyCode::R) {
                    if let Err(e) = view.restart() {
                        error!(error = %e, "could not restart episode");
                        break;
                    }
                }
            }
        }

        if is_key_pressed(KeyCode::C) {
            view.copy_to_clipboard();
        }

        view.update(get_frame_time());
        view.draw();

        next_frame().await
    }
}
