use super::*;

fn cfg_500() -> RenderConfig {
    RenderConfig {
        board_size: 10.0,
        slot_size: 2.0,
        width: 500,
        height: 500,
        fps: 24,
        particle_ids: false,
        font: None,
    }
}

const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

#[test]
fn empty_frame_is_black_with_white_outline() {
    let mut r = FrameRenderer::without_text(&cfg_500(), 1.0).unwrap();
    let frame = r.render(&[], None).unwrap();
    assert_eq!(frame.width, 500);
    assert_eq!(frame.height, 500);
    assert_eq!(frame.data.len(), 500 * 500 * 4);

    // Top edge at y=20, bottom edge at y=480, 2px wide.
    assert_eq!(frame.pixel(243, 20), WHITE);
    assert_eq!(frame.pixel(243, 479), WHITE);
    // Inside the board and outside the outline.
    assert_eq!(frame.pixel(243, 250), BLACK);
    assert_eq!(frame.pixel(5, 5), BLACK);
    assert_eq!(frame.pixel(499, 499), BLACK);
    // Slot chamber extends to the right of the board between y=204 and y=296.
    assert_eq!(frame.pixel(490, 204), WHITE);
    assert_eq!(frame.pixel(490, 295), WHITE);
    assert_eq!(frame.pixel(490, 250), BLACK);
    assert_eq!(frame.pixel(490, 100), BLACK);
}

#[test]
fn particles_draw_at_mapped_positions_with_speed_colors() {
    // Both speeds equal the max, so both are red.
    let particles = [
        Particle::new(0.0, 0.0, 1.0, 0.0, 1.0),
        Particle::new(5.0, 5.0, 0.0, 1.0, 1.0),
    ];
    let mut r = FrameRenderer::without_text(&cfg_500(), 1.0).unwrap();
    let frame = r.render(&particles, None).unwrap();

    let c = r.mapping().map_point(5.0, 5.0);
    assert_eq!(frame.pixel(c.x as u32, c.y as u32), RED);
    // Inside the first particle, which straddles the board corner and hides the outline there.
    assert_eq!(frame.pixel(30, 40), RED);
    assert_eq!(frame.pixel(14, 21), RED);
    // Background stays black away from geometry.
    assert_eq!(frame.pixel(100, 400), BLACK);
    assert_eq!(frame.pixel(499, 0), BLACK);
}

#[test]
fn slow_particles_are_blue_and_zero_max_speed_forces_blue() {
    let particles = [Particle::new(5.0, 5.0, 0.0, 0.0, 1.0)];
    let mut r = FrameRenderer::without_text(&cfg_500(), 2.0).unwrap();
    let frame = r.render(&particles, None).unwrap();
    let c = r.mapping().map_point(5.0, 5.0);
    assert_eq!(frame.pixel(c.x as u32, c.y as u32), BLUE);

    let fast = [Particle::new(5.0, 5.0, 9.0, 9.0, 1.0)];
    let mut r = FrameRenderer::without_text(&cfg_500(), 0.0).unwrap();
    let frame = r.render(&fast, None).unwrap();
    assert_eq!(frame.pixel(c.x as u32, c.y as u32), BLUE);
}

#[test]
fn later_particles_occlude_earlier_ones() {
    let particles = [
        Particle::new(5.0, 5.0, 0.0, 0.0, 1.0),
        Particle::new(5.0, 5.0, 1.0, 0.0, 0.5),
    ];
    let mut r = FrameRenderer::without_text(&cfg_500(), 1.0).unwrap();
    let frame = r.render(&particles, None).unwrap();
    let c = r.mapping().map_point(5.0, 5.0);
    assert_eq!(frame.pixel(c.x as u32, c.y as u32), RED);
    // Outside the small circle, inside the big one.
    assert_eq!(frame.pixel(c.x as u32 + 35, c.y as u32), BLUE);
}

#[test]
fn renderer_is_reusable_across_frames() {
    let mut r = FrameRenderer::without_text(&cfg_500(), 1.0).unwrap();
    let a = r
        .render(&[Particle::new(5.0, 5.0, 1.0, 0.0, 1.0)], None)
        .unwrap();
    let b = r.render(&[], None).unwrap();
    let c = r.mapping().map_point(5.0, 5.0);
    assert_eq!(a.pixel(c.x as u32, c.y as u32), RED);
    assert_eq!(b.pixel(c.x as u32, c.y as u32), BLACK);
}

#[test]
fn degenerate_radius_is_skipped() {
    let mut r = FrameRenderer::without_text(&cfg_500(), 1.0).unwrap();
    let frame = r
        .render(&[Particle::new(5.0, 5.0, 1.0, 0.0, 0.0)], None)
        .unwrap();
    let c = r.mapping().map_point(5.0, 5.0);
    assert_eq!(frame.pixel(c.x as u32, c.y as u32), BLACK);
}

#[test]
fn counter_overlay_draws_text_when_a_font_is_available() {
    let mut r = match FrameRenderer::new(&cfg_500(), 1.0) {
        Ok(r) if r.has_text() => r,
        _ => {
            eprintln!("skipping: no usable system font");
            return;
        }
    };
    let with = r.render(&[], Some(12)).unwrap();
    let without = r.render(&[], None).unwrap();
    let region_differs = (0..40u32)
        .flat_map(|y| (0..200u32).map(move |x| (x, y)))
        .any(|(x, y)| with.pixel(x, y) != without.pixel(x, y));
    assert!(region_differs);
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = RenderConfig {
        width: 30,
        ..cfg_500()
    };
    assert!(FrameRenderer::without_text(&cfg, 1.0).is_err());
}

fn renderer_with_font(cfg: &RenderConfig) -> Option<FrameRenderer> {
    match FrameRenderer::new(cfg, 1.0) {
        Ok(r) if r.has_text() => Some(r),
        _ => None,
    }
}

fn is_dark(px: [u8; 4]) -> bool {
    px[0] < 64 && px[1] < 64 && px[2] < 64
}

#[test]
fn particle_id_is_drawn_centered_inside_its_circle() {
    let cfg = RenderConfig {
        particle_ids: true,
        ..cfg_500()
    };
    let Some(mut r) = renderer_with_font(&cfg) else {
        eprintln!("skipping: no usable system font");
        return;
    };
    let frame = r
        .render(&[Particle::new(5.0, 5.0, 1.0, 0.0, 1.0)], None)
        .unwrap();
    let c = r.mapping().map_point(5.0, 5.0);
    let inner = r.mapping().map_radius(1.0) - 6.0;

    let (mut n, mut sx, mut sy) = (0u32, 0.0, 0.0);
    for y in (c.y - inner) as u32..=(c.y + inner) as u32 {
        for x in (c.x - inner) as u32..=(c.x + inner) as u32 {
            let (dx, dy) = (f64::from(x) + 0.5 - c.x, f64::from(y) + 0.5 - c.y);
            if dx.hypot(dy) <= inner && is_dark(frame.pixel(x, y)) {
                n += 1;
                sx += f64::from(x) + 0.5;
                sy += f64::from(y) + 0.5;
            }
        }
    }
    assert!(n > 100, "only {n} label pixels inside the circle");
    let (cx, cy) = (sx / f64::from(n), sy / f64::from(n));
    assert!((cx - c.x).abs() < 10.0, "label centroid x {cx} vs {}", c.x);
    assert!((cy - c.y).abs() < 12.0, "label centroid y {cy} vs {}", c.y);
}

#[test]
fn counter_spans_its_laid_out_width() {
    let Some(mut r) = renderer_with_font(&cfg_500()) else {
        eprintln!("skipping: no usable system font");
        return;
    };
    let with = r.render(&[], Some(12)).unwrap();
    let without = r.render(&[], None).unwrap();
    let block = r
        .text
        .as_mut()
        .unwrap()
        .layout("Collisions: 12", COUNTER_FONT_PX, Rgba8::WHITE)
        .unwrap();

    let columns: Vec<u32> = (0..500u32)
        .filter(|&x| (0..60u32).any(|y| with.pixel(x, y) != without.pixel(x, y)))
        .collect();
    let (first, last) = (columns[0], columns[columns.len() - 1]);
    assert!((8..=20).contains(&first), "counter starts at x={first}");
    let span = f64::from(last - first);
    assert!(
        span > 0.7 * block.width() && span < block.width() + 4.0,
        "inked span {span} vs layout width {}",
        block.width()
    );
}
