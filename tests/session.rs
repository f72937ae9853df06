use cutoutfe::components::crop::CropHandle;
use cutoutfe::ops::filters::apply_filter_chain;
use cutoutfe::{
    AlphaMask, AspectRatio, CropRect, EditorError, EditorSession, EditorSettings, FilterPreset, FilterStack,
    FnSegmenter, Gallery, GestureEvent, PixelBuffer, Point, SegmentationError, Tool, io, open_session,
};

const BORDER: [u8; 4] = [240, 240, 240, 255];
const FILL: [u8; 4] = [30, 90, 200, 255];

/// `w × h` border colour with a `rw × rh` block of FILL at (rx, ry).
fn framed(w: u32, h: u32, rx: u32, ry: u32, rw: u32, rh: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new_filled(w, h, BORDER);
    for y in ry..ry + rh {
        for x in rx..rx + rw {
            buf.put_pixel(x, y, FILL);
        }
    }
    buf
}

fn gradient(w: u32, h: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            buf.put_pixel(x, y, [(x * 11 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255]);
        }
    }
    buf
}

fn opaque_mask() -> FnSegmenter<impl Fn(&PixelBuffer) -> Result<AlphaMask, SegmentationError> + Sync> {
    FnSegmenter(|img: &PixelBuffer| -> Result<AlphaMask, SegmentationError> {
        Ok(AlphaMask::filled(img.width(), img.height(), 255))
    })
}

fn open(buf: &PixelBuffer) -> EditorSession {
    let bytes = io::encode_png(buf).unwrap();
    pollster::block_on(open_session(&bytes, &opaque_mask())).unwrap()
}

fn click(x: f32, y: f32) -> [GestureEvent; 1] {
    [GestureEvent::Down(Point::new(x, y))]
}

#[test]
fn open_composites_the_mask_into_alpha() {
    let src = gradient(8, 6);
    let bytes = io::encode_png(&src).unwrap();
    let seg = FnSegmenter(|img: &PixelBuffer| {
        let data: Vec<u8> = (0..img.width() * img.height()).map(|i| (i % 256) as u8).collect();
        AlphaMask::new(img.width(), img.height(), data)
    });
    let session = pollster::block_on(open_session(&bytes, &seg)).unwrap();
    let px = session.pixels().get_pixel(3, 2);
    let orig = src.get_pixel(3, 2);
    assert_eq!(&px[..3], &orig[..3]);
    assert_eq!(px[3], (2 * 8 + 3) as u8);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn segmentation_failure_opens_no_session() {
    let bytes = io::encode_png(&gradient(4, 4)).unwrap();
    let failing = FnSegmenter(|_: &PixelBuffer| -> Result<AlphaMask, SegmentationError> {
        Err(SegmentationError::Failed("model offline".into()))
    });
    let res = pollster::block_on(open_session(&bytes, &failing));
    assert!(matches!(res, Err(EditorError::Segmentation(_))));

    let wrong_size = FnSegmenter(|_: &PixelBuffer| -> Result<AlphaMask, SegmentationError> {
        Ok(AlphaMask::filled(3, 3, 255))
    });
    let res = pollster::block_on(open_session(&bytes, &wrong_size));
    assert!(matches!(
        res,
        Err(EditorError::Segmentation(SegmentationError::MaskSizeMismatch { .. }))
    ));
}

#[test]
fn malformed_input_is_an_input_error() {
    let res = pollster::block_on(open_session(b"\x89PNG garbage", &opaque_mask()));
    assert!(matches!(res, Err(EditorError::Input(_))));
}

#[test]
fn filter_chain_never_drifts() {
    let original = gradient(24, 16);
    let stacks = [
        FilterStack { brightness: 150.0, contrast: 80.0, ..FilterStack::default() },
        FilterStack { hue: -120.0, saturation: 180.0, blur: 1.5, ..FilterStack::default() },
        FilterPreset::Vintage.stack(),
        FilterPreset::Dramatic.stack(),
    ];
    for f in stacks {
        let first = apply_filter_chain(&original, &f, 0.0);
        assert_eq!(apply_filter_chain(&original, &FilterStack::default(), 0.0), original);
        assert_eq!(apply_filter_chain(&original, &f, 0.0), first);
    }
}

#[test]
fn session_filters_return_exactly_to_the_original() {
    let mut session = open(&gradient(20, 20));
    let before = session.display().clone();
    session.set_filter(FilterStack { brightness: 150.0, ..FilterStack::default() });
    let bright = session.display().clone();
    assert_ne!(bright, before);
    session.set_filter(FilterStack::default());
    assert_eq!(session.display(), &before);
    session.set_filter(FilterStack { brightness: 150.0, ..FilterStack::default() });
    assert_eq!(session.display(), &bright);
}

#[test]
fn undo_redo_inverse_law() {
    let mut session = open(&framed(40, 30, 10, 10, 12, 8));
    let mut states = vec![session.pixels().clone()];

    session.apply_tool(Tool::MagicWand, &click(15.0, 12.0));
    states.push(session.pixels().clone());
    session.flip_horizontal();
    states.push(session.pixels().clone());
    session.apply_tool(
        Tool::Eraser,
        &[
            GestureEvent::Down(Point::new(5.0, 5.0)),
            GestureEvent::Move(Point::new(25.0, 5.0)),
            GestureEvent::Up(Point::new(25.0, 5.0)),
        ],
    );
    states.push(session.pixels().clone());
    session.rotate_90(true);
    states.push(session.pixels().clone());

    let n = states.len() - 1;
    assert_eq!(session.history().undo_count(), n);
    for k in 1..=n {
        for _ in 0..k {
            assert!(session.undo());
        }
        assert_eq!(session.pixels(), &states[n - k]);
        for _ in 0..k {
            assert!(session.redo());
        }
        assert_eq!(session.pixels(), &states[n]);
    }
    assert!(!session.redo());
}

#[test]
fn undo_at_oldest_state_is_a_no_op() {
    let mut session = open(&gradient(5, 5));
    let before = session.pixels().clone();
    assert!(!session.undo());
    assert_eq!(session.pixels(), &before);
}

#[test]
fn new_commit_after_undo_drops_redo_branch() {
    let mut session = open(&gradient(10, 10));
    session.flip_horizontal();
    session.flip_vertical();
    assert!(session.undo());
    session.rotate_180();
    assert!(!session.history().can_redo());
    assert_eq!(session.history().undo_description(), Some("Rotate 180°"));
}

#[test]
fn magic_wand_erases_exactly_the_rectangle() {
    let (w, h, rx, ry, rw, rh) = (64, 48, 9, 7, 30, 20);
    let mut session = open(&framed(w, h, rx, ry, rw, rh));
    assert!(session.apply_tool(Tool::MagicWand, &click(20.0, 15.0)));
    for y in 0..h {
        for x in 0..w {
            let inside = (rx..rx + rw).contains(&x) && (ry..ry + rh).contains(&y);
            let px = session.pixels().get_pixel(x, y);
            if inside {
                assert_eq!(px[3], 0, "({}, {}) should be erased", x, y);
            } else {
                assert_eq!(px, BORDER, "({}, {}) should be untouched", x, y);
            }
        }
    }
    assert_eq!(session.history().undo_description(), Some("Magic Wand"));
}

#[test]
fn magic_wand_on_transparent_pixel_is_silent() {
    let mut session = open(&framed(20, 20, 5, 5, 5, 5));
    session.apply_tool(Tool::MagicWand, &click(6.0, 6.0));
    let entries = session.history().len();
    let before = session.pixels().clone();
    assert!(!session.apply_tool(Tool::MagicWand, &click(6.0, 6.0)));
    assert_eq!(session.pixels(), &before);
    assert_eq!(session.history().len(), entries);
}

#[test]
fn smart_brush_stroke_is_one_soft_edit() {
    let colour = [120, 140, 160, 255];
    let mut session = open(&PixelBuffer::new_filled(60, 40, colour));
    let entries = session.history().len();
    let at = |x: f32| Point::new(x, 20.5);
    let stroke = [
        GestureEvent::Down(at(20.5)),
        GestureEvent::Move(at(25.5)),
        GestureEvent::Move(at(30.5)),
        GestureEvent::Move(at(35.5)),
        GestureEvent::Up(at(35.5)),
    ];
    assert!(session.apply_tool(Tool::SmartBrush, &stroke));
    assert_eq!(session.history().len(), entries + 1);
    assert_eq!(session.history().undo_description(), Some("Smart Brush"));

    // Stamp centres go fully transparent.
    assert_eq!(session.pixels().alpha(20, 20), 0);
    assert_eq!(session.pixels().alpha(35, 20), 0);
    // Inside the disk but off-centre: faded, colour kept.
    let faded = session.pixels().get_pixel(20, 12);
    assert!(faded[3] > 0 && faded[3] < 255, "{faded:?}");
    assert_eq!(&faded[..3], &colour[..3]);
    // Beyond the radius of every stamp.
    for (x, y) in [(20, 2), (5, 20), (50, 20), (28, 35)] {
        assert_eq!(session.pixels().get_pixel(x, y), colour, "({x}, {y})");
    }

    assert!(session.undo());
    assert!(session.pixels().alpha_channel().all(|a| a == 255));
}

#[test]
fn crop_below_minimum_changes_nothing() {
    let mut session = open(&gradient(50, 50));
    let before = session.pixels().clone();
    session.set_crop_selection(CropRect::new(10.0, 10.0, 5.0, 5.0));
    assert!(!session.commit_crop());
    assert_eq!(session.pixels(), &before);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn crop_commit_keeps_the_region() {
    let src = gradient(60, 40);
    let mut session = open(&src);
    session.set_crop_selection(CropRect::new(12.0, 8.0, 30.0, 20.0));
    assert!(session.commit_crop());
    assert_eq!(session.pixels().dimensions(), (30, 20));
    assert_eq!(session.pixels().get_pixel(0, 0), src.get_pixel(12, 8));
    assert_eq!(session.pixels().get_pixel(29, 19), src.get_pixel(41, 27));
    assert!(session.crop().selection().is_none());
    assert_eq!(session.history().undo_description(), Some("Crop"));
}

#[test]
fn cancel_crop_leaves_pixels_alone() {
    let mut session = open(&gradient(50, 50));
    let before = session.pixels().clone();
    session.apply_tool(
        Tool::Crop,
        &[
            GestureEvent::Down(Point::new(5.0, 5.0)),
            GestureEvent::Move(Point::new(30.0, 30.0)),
            GestureEvent::Up(Point::new(30.0, 30.0)),
        ],
    );
    assert!(session.crop().selection().is_some());
    session.cancel_crop();
    assert!(session.crop().selection().is_none());
    assert_eq!(session.pixels(), &before);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn rotate_90_four_times_is_identity() {
    let src = gradient(13, 7);
    let mut session = open(&src);
    for i in 0..4 {
        session.rotate_90(true);
        let expected = if i % 2 == 0 { (7, 13) } else { (13, 7) };
        assert_eq!(session.pixels().dimensions(), expected);
        assert_eq!(session.overlay().dimensions(), expected);
    }
    assert_eq!(session.pixels(), &src);
}

#[test]
fn fixed_ratio_holds_for_every_handle_drag() {
    let target = 16.0 / 9.0;
    let mut session = open(&gradient(400, 300));
    session.set_aspect_ratio(AspectRatio::Fixed(target));
    session.set_crop_selection(CropRect::new(100.0, 80.0, 160.0, 90.0));

    let deltas = [(25.0, 4.0), (-6.0, 30.0), (-20.0, -3.0), (8.0, -15.0)];
    for handle in CropHandle::ALL {
        for (dx, dy) in deltas {
            let Some(rect) = session.crop().selection() else {
                panic!("selection lost");
            };
            let grab = rect.handle_position(handle);
            let to = Point::new(grab.x + dx, grab.y + dy);
            session.apply_tool(
                Tool::Crop,
                &[GestureEvent::Down(grab), GestureEvent::Move(to), GestureEvent::Up(to)],
            );
            let r = session.crop().selection().unwrap();
            assert!(
                (r.width / r.height - target).abs() < 1e-3,
                "{:?} by ({}, {}) gave {}x{}",
                handle,
                dx,
                dy,
                r.width,
                r.height
            );
        }
    }
}

#[test]
fn export_is_lossless_png_of_the_display() {
    let mut session = open(&framed(16, 16, 4, 4, 8, 8));
    session.apply_tool(Tool::MagicWand, &click(5.0, 5.0));
    let bytes = session.export_bytes().unwrap();
    assert_eq!(io::decode_image(&bytes).unwrap(), *session.pixels());

    session.apply_preset(FilterPreset::Noir);
    let filtered = io::decode_image(&session.export_bytes().unwrap()).unwrap();
    assert_eq!(&filtered, session.display());
    assert_ne!(&filtered, session.pixels());
}

#[test]
fn device_events_follow_zoom_and_bounds() {
    let mut session = open(&framed(100, 100, 0, 0, 50, 100));
    session.viewport_mut().set_zoom(2.0);
    // 100px buffer shown in a 100px box at 2x: device x 60 → image x 30.
    let bbox = cutoutfe::BoundingBox::new(0.0, 0.0, 100.0, 100.0);
    session.apply_tool_device(Tool::MagicWand, &click(60.0, 20.0), &bbox);
    assert_eq!(session.pixels().alpha(30, 10), 0);
    assert_eq!(session.pixels().alpha(75, 10), 255);
}

#[test]
fn gallery_keeps_newest_twenty() {
    let mut gallery = Gallery::from_settings(&EditorSettings::default());
    let mut ids = Vec::new();
    for i in 0..25 {
        let bytes = io::encode_png(&PixelBuffer::new_filled(2, 2, [i as u8, 0, 0, 255])).unwrap();
        let item = pollster::block_on(cutoutfe::gallery::process_file(
            &format!("img{}.jpg", i),
            &bytes,
            &opaque_mask(),
        ))
        .unwrap();
        ids.push(gallery.add(item));
    }
    assert_eq!(gallery.len(), 20);
    assert!(gallery.get(ids[4]).is_none());
    assert_eq!(gallery.iter().next().map(|i| i.file_name.as_str()), Some("img24.jpg"));
    assert_eq!(gallery.export_name(ids[24]).as_deref(), Some("img24-no-bg.png"));
}
