//! End-to-end scenarios against a scripted backend.

mod common;

#[cfg(test)]
mod scenario_tests {
    use super::common::{harness, mode, Call};
    use sdl_video::events::{Event, NativeEvent, WindowEventKind};
    use sdl_video::render::{BlendMode, RendererFlags, ScaleMode, TextureAccess};
    use sdl_video::video::{DriverRegistry, InitFlags, VideoDevice, VideoDisplay, WindowFlags};
    use sdl_video::{Color, EventQueue, PixelFormat, Rect, VideoError};

    fn window_events(events: &[Event], id: u32) -> Vec<WindowEventKind> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::Window { window, event, .. } if *window == id => Some(*event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_closest_mode_prefers_first_large_enough() {
        let mut h = harness();
        let request = mode(PixelFormat::UNKNOWN, 1000, 700, 0);

        let closest = h.device.closest_display_mode(&request).unwrap();
        assert_eq!(closest, mode(PixelFormat::RGB888, 1024, 768, 60));

        h.device.set_display_mode(Some(&mode(PixelFormat::RGB565, 800, 600, 0))).unwrap();
        h.device.set_display_mode(Some(&request)).unwrap();
        assert_eq!(
            h.device.current_display_mode().unwrap(),
            &mode(PixelFormat::RGB888, 1024, 768, 60)
        );
        assert_eq!(
            h.mode_switches(),
            vec![
                mode(PixelFormat::RGB565, 800, 600, 60),
                mode(PixelFormat::RGB888, 1024, 768, 60),
            ]
        );
    }

    #[test]
    fn test_request_larger_than_any_mode_fails() {
        let mut h = harness();
        let err = h
            .device
            .set_display_mode(Some(&mode(PixelFormat::UNKNOWN, 2048, 2048, 0)))
            .unwrap_err();
        assert_eq!(err, VideoError::NoModeLargeEnough { w: 2048, h: 2048 });
        assert!(h.mode_switches().is_empty());
    }

    #[test]
    fn test_second_fullscreen_window_minimizes_first() {
        let mut h = harness();
        h.device
            .set_fullscreen_display_mode(Some(&mode(PixelFormat::RGB565, 800, 600, 0)))
            .unwrap();
        assert!(h.mode_switches().is_empty());

        let fullscreen = WindowFlags::FULLSCREEN | WindowFlags::SHOWN;
        let w1 = h.device.create_window(Some("one"), 0, 0, 640, 480, fullscreen).unwrap();
        let w2 = h.device.create_window(Some("two"), 0, 0, 640, 480, fullscreen).unwrap();

        let events = h.events.drain();
        assert_eq!(window_events(&events, w1), vec![WindowEventKind::Minimized]);
        assert!(window_events(&events, w2).is_empty());
        assert!(h.device.window_flags(w1).unwrap().contains(WindowFlags::MINIMIZED));
        assert!(h.device.window(w2).unwrap().is_fullscreen_visible());

        assert_eq!(h.mode_switches(), vec![mode(PixelFormat::RGB565, 800, 600, 60)]);
        assert!(h.calls.lock().contains(&Call::Minimize(w1)));
    }

    #[test]
    fn test_restoring_fullscreen_window_takes_display_back() {
        let mut h = harness();
        let fullscreen = WindowFlags::FULLSCREEN | WindowFlags::SHOWN;
        let w1 = h.device.create_window(None, 0, 0, 640, 480, fullscreen).unwrap();
        let w2 = h.device.create_window(None, 0, 0, 640, 480, fullscreen).unwrap();

        h.device.restore_window(w1).unwrap();

        assert!(h.device.window(w1).unwrap().is_fullscreen_visible());
        assert!(h.device.window_flags(w2).unwrap().contains(WindowFlags::MINIMIZED));
    }

    #[test]
    fn test_destroying_minimized_fullscreen_window_keeps_mode() {
        let mut h = harness();
        h.device
            .set_fullscreen_display_mode(Some(&mode(PixelFormat::RGB565, 800, 600, 0)))
            .unwrap();
        let fullscreen = WindowFlags::FULLSCREEN | WindowFlags::SHOWN;
        let w1 = h.device.create_window(None, 0, 0, 640, 480, fullscreen).unwrap();
        let w2 = h.device.create_window(None, 0, 0, 640, 480, fullscreen).unwrap();
        assert!(h.device.window_flags(w1).unwrap().contains(WindowFlags::MINIMIZED));

        h.device.destroy_window(w1).unwrap();

        assert!(h.device.window(w2).unwrap().is_fullscreen_visible());
        assert_eq!(
            h.device.current_display_mode().unwrap(),
            &mode(PixelFormat::RGB565, 800, 600, 60)
        );
        assert_eq!(h.mode_switches(), vec![mode(PixelFormat::RGB565, 800, 600, 60)]);
    }

    #[test]
    fn test_pixel_io_rejects_bad_rects() {
        let mut h = harness();
        let window = h.device.create_window(None, 0, 0, 4, 4, WindowFlags::SHOWN).unwrap();
        h.device.create_renderer(window, None, RendererFlags::empty()).unwrap();
        let invalid = Err(VideoError::InvalidParam("rect"));

        let mut out = [0u8; 64];
        for rect in [
            Rect::new(8, 3, -5, 1),
            Rect::new(0, 0, 0, 4),
            Rect::new(4, 0, 1, 1),
            Rect::new(-1, -1, 2, 2),
            Rect::new(1, 0, i32::MAX, 1),
            Rect::new(i32::MAX, i32::MAX, i32::MAX, i32::MAX),
        ] {
            assert_eq!(h.device.render_read_pixels(Some(&rect), &mut out, 16), invalid);
            assert_eq!(h.device.render_write_pixels(Some(&rect), &out, 16), invalid);
        }

        let rows = [0xABu8; 64];
        h.device.render_write_pixels(None, &rows, 16).unwrap();
        h.device.render_read_pixels(None, &mut out, 16).unwrap();
        assert_eq!(out, rows);
        h.device.render_present().unwrap();
    }

    #[test]
    fn test_fill_and_copy_clip_extreme_rects() {
        let mut h = harness();
        let window = h.device.create_window(None, 0, 0, 4, 4, WindowFlags::SHOWN).unwrap();
        h.device.create_renderer(window, None, RendererFlags::empty()).unwrap();
        let red = Color::rgb(0xFF, 0, 0);

        h.device.render_fill(Some(&Rect::new(8, 3, -5, 1)), red).unwrap();
        h.device.render_fill(Some(&Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX)), red).unwrap();
        h.device.render_fill(Some(&Rect::new(1, 0, i32::MAX, 1)), red).unwrap();

        let mut row = [0u8; 16];
        h.device.render_read_pixels(Some(&Rect::new(0, 0, 4, 1)), &mut row, 16).unwrap();
        assert_eq!(row[..4], [0; 4]);
        assert!(row[4..].chunks(4).all(|pixel| pixel != [0; 4]));

        let texture = h
            .device
            .create_texture(PixelFormat::ARGB8888, TextureAccess::Streaming, 2, 2)
            .unwrap();
        for (src, dst) in [
            (None, Rect::new(i32::MAX - 1, 0, 2, 2)),
            (None, Rect::new(2, 2, i32::MAX, i32::MAX)),
            (Some(Rect::new(0, 0, i32::MAX, i32::MAX)), Rect::new(-3, -3, 0, 5)),
            (Some(Rect::new(-5, -5, -1, -1)), Rect::new(0, 0, 4, 4)),
        ] {
            for scale in [ScaleMode::NONE, ScaleMode::FAST] {
                h.device
                    .render_copy(texture, src.as_ref(), Some(&dst), BlendMode::NONE, scale)
                    .unwrap();
            }
        }
        h.device.render_present().unwrap();
    }

    #[test]
    fn test_extreme_mouse_motion_saturates() {
        let mut h = harness();
        let mouse = h.device.add_mouse();

        assert!(h.device.send_mouse_motion(mouse, false, i32::MAX, i32::MIN));
        assert!(h.device.send_mouse_motion(mouse, true, i32::MAX, i32::MIN));
        assert!(h.device.send_mouse_motion(mouse, false, i32::MIN, i32::MAX));

        let state = h.device.input().mouse(mouse).unwrap();
        assert_eq!((state.x, state.y), (i32::MIN, i32::MAX));
    }

    #[test]
    fn test_texture_ids_are_not_reused() {
        let mut h = harness();
        let window = h.device.create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN).unwrap();
        assert_eq!(window, 1);
        h.device.create_renderer(window, None, RendererFlags::empty()).unwrap();

        let ids: Vec<u32> = (0..4)
            .map(|_| {
                h.device
                    .create_texture(PixelFormat::ARGB8888, TextureAccess::Streaming, 8, 8)
                    .unwrap()
            })
            .collect();
        assert_eq!(ids, vec![2, 3, 4, 5]);

        h.device.destroy_texture(5).unwrap();
        assert!(h.device.texture(5).is_none());
        assert_eq!(h.device.destroy_texture(5), Err(VideoError::InvalidTexture(5)));

        let next = h
            .device
            .create_texture(PixelFormat::ARGB8888, TextureAccess::Streaming, 8, 8)
            .unwrap();
        assert_eq!(next, 6);
    }

    #[test]
    fn test_duplicate_mode_is_listed_once() {
        let mut display = VideoDisplay::new(mode(PixelFormat::RGB888, 640, 480, 60));
        let extra = mode(PixelFormat::RGB565, 320, 240, 70);
        assert!(display.add_display_mode(extra.clone()));
        assert!(!display.add_display_mode(extra));
        assert_eq!(display.display_modes().len(), 1);
    }

    #[test]
    fn test_backend_modes_are_fetched_once() {
        let mut h = harness();
        assert_eq!(h.device.num_display_modes(), 2);
        assert_eq!(h.device.display_mode(0).unwrap(), mode(PixelFormat::RGB888, 1024, 768, 60));
        assert_eq!(h.device.display_mode(1).unwrap(), mode(PixelFormat::RGB565, 800, 600, 60));
        assert!(matches!(
            h.device.display_mode(2),
            Err(VideoError::IndexOutOfRange { index: 2, count: 2, .. })
        ));
    }

    #[test]
    fn test_focus_loss_gives_desktop_back() {
        let mut h = harness();
        h.device
            .set_fullscreen_display_mode(Some(&mode(PixelFormat::RGB565, 800, 600, 0)))
            .unwrap();
        let window = h
            .device
            .create_window(None, 0, 0, 640, 480, WindowFlags::FULLSCREEN | WindowFlags::SHOWN)
            .unwrap();
        h.device.add_keyboard();

        h.queue_native(NativeEvent::KeyboardFocus {
            keyboard: 0,
            window: Some(window),
        });
        h.device.pump_events();
        assert_eq!(h.device.focus_window(), Some(window));

        h.queue_native(NativeEvent::KeyboardFocus {
            keyboard: 0,
            window: None,
        });
        h.device.pump_events();

        assert_eq!(h.device.focus_window(), None);
        assert!(h.device.window_flags(window).unwrap().contains(WindowFlags::MINIMIZED));
        assert_eq!(
            h.device.current_display_mode().unwrap(),
            h.device.desktop_display_mode().unwrap()
        );
        assert_eq!(
            h.mode_switches(),
            vec![
                mode(PixelFormat::RGB565, 800, 600, 60),
                mode(PixelFormat::RGB888, 1024, 768, 60),
            ]
        );
    }

    #[test]
    fn test_focus_reapplies_gamma_and_grab() {
        let mut h = harness();
        let window = h
            .device
            .create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN | WindowFlags::INPUT_GRABBED)
            .unwrap();
        h.device.set_gamma(1.5, 1.5, 1.5).unwrap();
        h.calls.lock().clear();

        h.device.send_window_event(window, WindowEventKind::FocusGained, 0, 0);
        h.device.send_window_event(window, WindowEventKind::FocusLost, 0, 0);

        let calls = h.calls.lock().clone();
        assert_eq!(
            calls,
            vec![Call::Gamma, Call::Grab(window), Call::Gamma, Call::Grab(window)]
        );
    }

    #[test]
    fn test_destroy_window_sends_focus_lost_and_hooks() {
        let mut h = harness();
        let window = h.device.create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN).unwrap();
        h.events.drain();

        h.device.destroy_window(window).unwrap();

        assert_eq!(
            window_events(&h.events.drain(), window),
            vec![WindowEventKind::FocusLost]
        );
        let calls = h.calls.lock().clone();
        assert_eq!(calls, vec![Call::CreateWindow(window), Call::DestroyWindow(window)]);
        assert_eq!(h.device.destroy_window(window), Err(VideoError::InvalidWindow(window)));
    }

    #[test]
    fn test_quit_tears_everything_down() {
        let h = harness();
        let calls = h.calls.clone();
        let events = h.events.clone();
        let mut device = h.device;
        device.create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN).unwrap();
        device.create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN).unwrap();

        device.quit();

        let calls = calls.lock().clone();
        assert_eq!(calls.last(), Some(&Call::Quit));
        assert_eq!(
            calls.iter().filter(|call| matches!(call, Call::DestroyWindow(_))).count(),
            2
        );
        assert!(!events.is_running());
    }

    #[test]
    fn test_unknown_driver_stops_events() {
        let events = EventQueue::new();
        let err = VideoDevice::init(
            &DriverRegistry::default(),
            Some("nonexistent"),
            InitFlags::empty(),
            Box::new(events.clone()),
        )
        .unwrap_err();
        assert_eq!(err, VideoError::DriverNotAvailable("nonexistent".into()));
        assert!(!events.is_running());
    }

    #[test]
    fn test_empty_registry_has_no_device() {
        let err = VideoDevice::init(
            &DriverRegistry::empty(),
            None,
            InitFlags::empty(),
            Box::new(EventQueue::new()),
        )
        .unwrap_err();
        assert_eq!(err, VideoError::NoAvailableDevice);
    }
}
