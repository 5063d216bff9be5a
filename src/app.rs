use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::config;
use crate::core::{CoreOptions, Directive, PlayerCore};
use crate::disc::DiscSpin;
use crate::locate;
use crate::media;
use crate::ui::{self, Trail, Visuals};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use image::RgbaImage;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SEEK_STEP_SECONDS: f64 = 5.0;

#[derive(Debug, Default)]
pub struct AppOptions {
    pub desktop_host: bool,
    pub initial_media: Option<PathBuf>,
}

pub fn run(options: AppOptions) -> Result<()> {
    let desktop_host = options.desktop_host || config::is_desktop_host();
    let mut core = PlayerCore::new(CoreOptions {
        desktop_host,
        media_cache: config::cache_root()?,
    });

    let mut audio: Box<dyn AudioEngine> = match RodioAudioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(_) => {
            core.set_status("No audio output available; running silent");
            Box::new(NullAudioEngine::new())
        }
    };

    if let Some(path) = options.initial_media {
        let directive = core.open_media(&path);
        apply_directive(&mut core, &mut *audio, directive);
    }

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut trail = Trail::new();
    let mut spin = DiscSpin::new();
    let mut cover = CoverCache::default();
    let mut last_tick = Instant::now();
    let mut last_frame = Instant::now();

    let result: Result<()> = loop {
        pump_media_events(&mut core, &mut *audio);

        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();
        spin.advance(dt, core.is_playing);

        trail.fade();
        if core.is_playing && let Some(spectrum) = audio.spectrum() {
            trail.merge(&spectrum.bins());
        }

        let animating = core.is_playing || !trail.is_dark();
        if animating || core.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            cover.refresh(&core);
            terminal.draw(|frame| {
                let visuals = Visuals {
                    trail: &trail,
                    cover: cover.image(),
                    angle: spin.angle(),
                };
                ui::draw(
                    frame,
                    &core,
                    &visuals,
                    command_mode.then_some(command_buffer.as_str()),
                );
            })?;
            core.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // A visible notice is a blocking alert: any key dismisses it.
        if core.notice.is_some() {
            core.dismiss_notice();
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(&mut core, &mut *audio, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    core.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    core.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Char('q') => break Ok(()),
            KeyCode::Char(' ') => {
                let directive = core.toggle_play_pause();
                apply_directive(&mut core, &mut *audio, directive);
            }
            KeyCode::Esc => core.exit_hidden(),
            KeyCode::Char('h') => core.toggle_hide_ui(),
            KeyCode::Char('n') => {
                let directive = core.advance();
                apply_directive(&mut core, &mut *audio, directive);
            }
            KeyCode::Left => seek_by(&mut core, &mut *audio, -SEEK_STEP_SECONDS),
            KeyCode::Right => seek_by(&mut core, &mut *audio, SEEK_STEP_SECONDS),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = (audio.volume() + 0.05).clamp(0.0, 2.0);
                audio.set_volume(next);
                core.set_status(&format!("Volume: {}%", (next * 100.0).round() as u16));
            }
            KeyCode::Char('-') => {
                let next = (audio.volume() - 0.05).clamp(0.0, 2.0);
                audio.set_volume(next);
                core.set_status(&format!("Volume: {}%", (next * 100.0).round() as u16));
            }
            KeyCode::Char(':') => {
                command_mode = true;
                core.dirty = true;
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn pump_media_events(core: &mut PlayerCore, audio: &mut dyn AudioEngine) {
    if let Some(position) = audio.position() {
        core.on_time_update(position.as_secs_f64());
    }

    if audio.is_finished() {
        let directive = core.on_ended();
        apply_directive(core, audio, directive);
    }
}

fn apply_directive(core: &mut PlayerCore, audio: &mut dyn AudioEngine, directive: Directive) {
    match directive {
        Directive::None => {}
        Directive::Pause => audio.pause(),
        Directive::Resume => {
            if audio.current_track().is_none() {
                // Resuming a stopped track starts it over from the top. A
                // rejected load is swallowed and the playing flag stays
                // optimistic.
                if let Some(path) = core.track_playback_path()
                    && audio.load(&path).is_ok()
                {
                    audio.resume();
                }
                return;
            }
            audio.resume();
        }
        Directive::Seek(position) => {
            let _ = audio.seek_to(position);
        }
        Directive::Load(path) => {
            // A rejected load never fires the metadata event, so the latch
            // and the optimistic playing flag both stay put.
            if audio.load(&path).is_ok() {
                let duration = audio.duration().map_or(0.0, |known| known.as_secs_f64());
                let next = core.on_metadata_loaded(duration);
                apply_directive(core, audio, next);
            }
        }
        Directive::Stop => audio.stop(),
    }
}

fn seek_by(core: &mut PlayerCore, audio: &mut dyn AudioEngine, delta: f64) {
    let target = (core.position_seconds + delta).clamp(0.0, core.duration_seconds.max(0.0));
    let directive = core.seek(target);
    apply_directive(core, audio, directive);
}

fn run_command(core: &mut PlayerCore, audio: &mut dyn AudioEngine, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        core.set_status("No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => {
            core.set_status("Commands: open <audio or .json playlist> | cover <image> | seek <seconds> | help");
        }
        "open" => {
            if rest.is_empty() {
                core.set_status("Usage: open <path>");
            } else {
                let directive = core.open_media(Path::new(rest));
                apply_directive(core, audio, directive);
            }
        }
        "cover" => {
            if rest.is_empty() {
                core.set_status("Usage: cover <path>");
            } else {
                let directive = core.set_cover(Path::new(rest));
                apply_directive(core, audio, directive);
            }
        }
        "seek" => match rest.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() => {
                let target = seconds.clamp(0.0, core.duration_seconds.max(0.0));
                let directive = core.seek(target);
                apply_directive(core, audio, directive);
            }
            _ => core.set_status("Usage: seek <seconds>"),
        },
        _ => core.set_status("Unknown command. Use :help"),
    }
}

#[derive(Default)]
struct CoverCache {
    key: Option<String>,
    image: Option<RgbaImage>,
}

impl CoverCache {
    // Reload only when the cover identity changes; decoding every frame
    // would stall the loop.
    fn refresh(&mut self, core: &PlayerCore) {
        let key = core.track.cover.clone().or_else(|| {
            core.track_playback_path()
                .map(|path| format!("embedded:{}", path.display()))
        });
        if key == self.key {
            return;
        }
        self.key = key;

        self.image = match (&core.track.cover, core.track_playback_path()) {
            (Some(url), _) => media::open_cover(&locate::from_file_url(url)),
            (None, Some(path)) => media::embedded_cover_art(&path)
                .as_deref()
                .and_then(media::decode_cover),
            _ => None,
        };
    }

    fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }
}
