use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::render::{
    canvas_to_cells, draw_center_box, draw_flask, hud, BubbleSprites, Terminal, Viewport,
};
use bubbleflask::config::{update_settings, Paths, Settings};
use bubbleflask::{Field, Flask, Phase, Ticker};
use std::time::{Duration, Instant};

/// Physics rate; the field is tuned per tick, so this stays fixed.
const SIM_HZ: u32 = 60;
const MAX_CATCH_UP: u32 = 8;

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    field: Field,
    flask: Flask,
    ticker: Ticker,
    sprites: BubbleSprites,
    term: Terminal,
    should_quit: bool,
    frame: u64,
}

impl App {
    fn init(settings: Settings, paths: Paths) -> anyhow::Result<Self> {
        let seed = if settings.seed == 0 {
            rand::random()
        } else {
            settings.seed
        };
        let field = Field::initialize(settings.field_params(), seed);
        let flask = Flask::new(settings.fuse());
        let sprites = BubbleSprites::for_field(&field);
        log::info!(
            "starting: {} bubbles r={} in {}x{}, fuse {:.1}s, seed {:#x}",
            field.len(),
            settings.radius,
            settings.width,
            settings.height,
            flask.fuse().as_secs_f32(),
            field.seed()
        );

        let term = Terminal::begin()?;
        Ok(Self {
            settings,
            paths,
            field,
            flask,
            ticker: Ticker::from_hz(SIM_HZ, MAX_CATCH_UP),
            sprites,
            term,
            should_quit: false,
            frame: 0,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(ev) {
                    self.apply(action);
                }
                if self.should_quit {
                    break;
                }
            }

            let now = Instant::now();
            let ticks = self.ticker.advance(now.saturating_duration_since(last_frame));
            last_frame = now;
            self.flask.drive(&mut self.field, ticks, self.ticker.step());

            self.render_frame()?;
            self.frame = self.frame.wrapping_add(1);

            spin_sleep(frame_dt, Instant::now());
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::ToggleBurner => self.flask.toggle_burner(),
            Action::Reset => {
                self.flask.restart(&mut self.field);
                self.ticker.clear();
            }
            Action::ToggleColor => self.settings.enable_color = !self.settings.enable_color,
            Action::ToggleHud => self.settings.show_hud = !self.settings.show_hud,
            Action::Quit => self.should_quit = true,
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let bg = crossterm::style::Color::Black;
        self.term.cur.clear(bg);
        self.term.canvas.clear();

        // leave room for the HUD rows and the burner flame under the flask
        let bounds = self.field.params().bounds;
        let vp = Viewport::fit(
            self.term.canvas.w,
            self.term.canvas.h.saturating_sub(16),
            bounds.width,
            bounds.height,
            6.0,
        );
        draw_flask(
            &mut self.term.canvas,
            vp,
            &self.field,
            &self.sprites,
            &self.flask,
            self.frame,
        );
        canvas_to_cells(
            &self.term.canvas,
            &mut self.term.cur,
            self.settings.enable_color,
            bg,
        );

        if self.settings.show_hud {
            hud(&mut self.term.cur, &self.field, &self.flask);
        }
        if let Phase::Exploded = self.flask.phase() {
            draw_center_box(
                &mut self.term.cur,
                "BOOM!",
                "The flask could not take the heat.\n\nPress R to sweep up and try again.",
            );
        }

        self.term.present()
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.term.end()?;
        // only the in-game toggles go back to disk, not one-off CLI overrides
        let (color, hud) = (self.settings.enable_color, self.settings.show_hud);
        update_settings(&self.paths.settings_path, |stored| {
            stored.enable_color = color;
            stored.show_hud = hud;
        })?;
        log::info!("bye");
        Ok(())
    }
}

pub(crate) fn run(settings: Settings, paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(settings, paths)?;
    let res = app.run();
    // restore the terminal even when the loop failed
    let end = app.shutdown();
    res.and(end)
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
