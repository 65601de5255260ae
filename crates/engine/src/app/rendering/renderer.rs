use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{ActiveMapState, ContainerKind, Entity, Vec2};
use crate::asset_refs::validate_image_ref;

use super::transform::{world_to_screen, Camera2D, Viewport};
use super::PLACEHOLDER_HALF_SIZE_PX;

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const PLAYER_PLACEHOLDER_COLOR: [u8; 4] = [80, 220, 255, 255];
const GATE_OUTLINE_COLOR: [u8; 4] = [255, 210, 70, 255];

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Source rectangle inside a sprite image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpriteRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_images: HashSet<String>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_images: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Draws every container back to front. A cleared map renders as an empty frame.
    pub(crate) fn render_map(&mut self, state: Option<&ActiveMapState>) -> Result<(), Error> {
        let viewport = self.viewport;
        let camera = state.map(camera_for).unwrap_or_default();
        let frame = self.pixels.frame_mut();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }

        if let Some(state) = state {
            for kind in ContainerKind::ALL {
                for entity in state.container(kind).entities() {
                    let (x, y) = world_to_screen(entity.position(), &camera, viewport);
                    if kind == ContainerKind::Gate {
                        let (w, h) = entity_extent_px(entity);
                        draw_rect_outline(frame, viewport, x, y, w, h, GATE_OUTLINE_COLOR);
                        continue;
                    }

                    let sprite = resolve_cached_sprite(
                        &mut self.sprite_cache,
                        &mut self.warned_missing_images,
                        &self.asset_root,
                        &entity.image,
                    );
                    match sprite {
                        Some(sprite) => {
                            let region = match entity.current_frame() {
                                Some((index, count)) => frame_region(sprite, index, count),
                                None => SpriteRegion {
                                    x: 0,
                                    y: 0,
                                    width: sprite.width,
                                    height: sprite.height,
                                },
                            };
                            draw_sprite_region(frame, viewport, x, y, sprite, region);
                        }
                        None => {
                            let color = if kind == ContainerKind::Player {
                                PLAYER_PLACEHOLDER_COLOR
                            } else {
                                PLACEHOLDER_COLOR
                            };
                            let (w, h) = entity_extent_px(entity);
                            draw_filled_rect(frame, viewport, x, y, w, h, color);
                        }
                    }
                }
            }
        }

        self.pixels.render()
    }
}

/// Centers the view on the player, or on the backdrop origin when there is no player.
fn camera_for(state: &ActiveMapState) -> Camera2D {
    let focus = state
        .player()
        .map(|player| {
            let size = player.size();
            player.position() + Vec2::new(size.x * 0.5, size.y * 0.5)
        })
        .or_else(|| state.backdrop().map(Entity::position))
        .unwrap_or_default();
    Camera2D { position: focus }
}

fn entity_extent_px(entity: &Entity) -> (i32, i32) {
    let size = entity.size();
    let fallback = PLACEHOLDER_HALF_SIZE_PX * 2;
    let w = if size.x > 0.0 { size.x.round() as i32 } else { fallback };
    let h = if size.y > 0.0 { size.y.round() as i32 } else { fallback };
    (w, h)
}

/// Animated sprites are horizontal strips of equally wide frames.
fn frame_region(sprite: &LoadedSprite, frame: u32, frame_count: u32) -> SpriteRegion {
    let frame_count = frame_count.max(1);
    let frame_width = (sprite.width / frame_count).max(1);
    let x = (frame % frame_count).saturating_mul(frame_width);
    SpriteRegion {
        x: x.min(sprite.width.saturating_sub(1)),
        y: 0,
        width: frame_width.min(sprite.width),
        height: sprite.height,
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_images: &mut HashSet<String>,
    asset_root: &Path,
    image: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(image) {
        let sprite = match resolve_sprite_image_path(asset_root, image) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(
                        warned_missing_images,
                        image,
                        Some(path.as_path()),
                        reason.as_str(),
                    );
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_missing_images, image, None, reason.as_str());
                None
            }
        };
        cache.insert(image.to_string(), sprite);
    }
    cache.get(image).and_then(Option::as_ref)
}

fn resolve_sprite_image_path(asset_root: &Path, image: &str) -> Result<PathBuf, String> {
    validate_image_ref(image).map_err(|error| format!("invalid_image_ref:{error}"))?;
    Ok(asset_root.join(image))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_images: &mut HashSet<String>,
    image: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_images.insert(image.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        image,
        path = %path_display,
        reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

fn write_pixel_rgba_clipped(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let offset = (y as usize * viewport.width as usize + x as usize) * 4;
    if let Some(pixel) = frame.get_mut(offset..offset + 4) {
        pixel.copy_from_slice(&color);
    }
}

fn draw_filled_rect(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    color: [u8; 4],
) {
    for y in top..top + height {
        for x in left..left + width {
            write_pixel_rgba_clipped(frame, viewport, x, y, color);
        }
    }
}

fn draw_rect_outline(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    color: [u8; 4],
) {
    let right = left + width - 1;
    let bottom = top + height - 1;
    for x in left..=right {
        write_pixel_rgba_clipped(frame, viewport, x, top, color);
        write_pixel_rgba_clipped(frame, viewport, x, bottom, color);
    }
    for y in top..=bottom {
        write_pixel_rgba_clipped(frame, viewport, left, y, color);
        write_pixel_rgba_clipped(frame, viewport, right, y, color);
    }
}

/// Copies `region` of `sprite` with its top-left corner at `(left, top)`, skipping
/// transparent pixels.
fn draw_sprite_region(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    sprite: &LoadedSprite,
    region: SpriteRegion,
) {
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }
    let region_right = (region.x + region.width).min(sprite.width);
    let region_bottom = (region.y + region.height).min(sprite.height);

    for src_y in region.y..region_bottom {
        let out_y = top + (src_y - region.y) as i32;
        if out_y < 0 || out_y >= viewport.height as i32 {
            continue;
        }
        for src_x in region.x..region_right {
            let out_x = left + (src_x - region.x) as i32;
            if out_x < 0 || out_x >= viewport.width as i32 {
                continue;
            }
            let src_offset = (src_y as usize * sprite.width as usize + src_x as usize) * 4;
            let alpha = sprite.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let color = [
                sprite.rgba[src_offset],
                sprite.rgba[src_offset + 1],
                sprite.rgba[src_offset + 2],
                alpha,
            ];
            write_pixel_rgba_clipped(frame, viewport, out_x, out_y, color);
        }
    }
}
