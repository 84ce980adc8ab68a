use crate::error::SceneError;
use crate::io::config::Config;
use crate::io::image::save_buffer_to_image;
use crate::pipeline::passes::{PostProcess, post_process_to_buffer};
use crate::pipeline::renderer::{FrameStats, Renderer};
use crate::scene::loader::build_scene;
use crate::ui::input::{InputSource, ScriptedInput};
use log::{debug, info, warn};
use nalgebra::Vector3;
use std::path::PathBuf;
use std::time::Instant;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: usize,
    /// Counters of the last frame.
    pub last_frame: FrameStats,
    pub output: Option<PathBuf>,
}

/// Renders `config.render.frames` frames headlessly with scripted input and
/// writes the last one to `config.render.output`.
///
/// Construction failures abort the run. Problems inside a frame are logged
/// and the loop carries on.
pub fn run(config: &Config) -> Result<RunSummary, SceneError> {
    let (width, height) = (config.window.width, config.window.height);
    info!(
        "Starting '{}' ({}x{}, {} frames)",
        config.window.title, width, height, config.render.frames
    );

    let mut renderer = Renderer::new(width, height, config.render.samples);
    renderer.rasterizer.set_cull_mode(config.render.cull_mode());
    renderer.rasterizer.wireframe = config.render.wireframe;

    let mut scene = build_scene(&mut renderer, config)?;
    let mut input = ScriptedInput::new(&config.input);
    let background = Vector3::from(config.render.background_color);
    let dt = config.render.time_step;

    let start = Instant::now();
    let mut last_report = Instant::now();
    let mut frames_since_report = 0;
    let mut total_time = 0.0;

    for frame in 0..config.render.frames {
        total_time += dt;

        let state = input.poll();
        scene.step_camera(&state, dt);
        scene.update(total_time);

        renderer.clear(background);
        scene.render(&mut renderer);
        debug!(
            "Frame {}: {} draw calls, {} primitives",
            frame, renderer.stats.draw_calls, renderer.stats.primitives
        );

        frames_since_report += 1;
        let elapsed = last_report.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            info!("FPS: {:.1}", frames_since_report as f32 / elapsed);
            frames_since_report = 0;
            last_report = Instant::now();
        }
    }

    let frames = config.render.frames;
    let seconds = start.elapsed().as_secs_f32();
    if frames > 0 {
        info!(
            "Rendered {} frames in {:.2}s ({:.1} FPS)",
            frames,
            seconds,
            frames as f32 / seconds.max(f32::EPSILON)
        );
    }
    let last_frame = renderer.stats;

    let output = if config.render.output.is_empty() {
        None
    } else {
        let path = PathBuf::from(&config.render.output);
        let mut buffer = vec![0u32; width * height];
        post_process_to_buffer(
            &renderer.framebuffer,
            &mut buffer,
            PostProcess {
                exposure: config.render.exposure,
                use_aces: config.render.use_aces,
            },
        );
        save_buffer_to_image(&buffer, width, height, &path)
            .map_err(|source| SceneError::Output {
                path: path.clone(),
                source,
            })?;
        info!("Saved '{}'", path.display());
        Some(path)
    };

    scene.release(&mut renderer);
    let leaked = renderer.live_objects();
    if leaked > 0 {
        warn!("{} render objects still alive after release", leaked);
    }

    Ok(RunSummary {
        frames,
        last_frame,
        output,
    })
}
