//! Property tests for ids, fullscreen exclusivity, mode lists, texture
//! ownership, window removal and caller-supplied rectangles.

mod common;

#[cfg(test)]
mod property_tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::common::{harness, mode};
    use sdl_video::events::WindowEventKind;
    use sdl_video::render::{BlendMode, RendererFlags, ScaleMode, TextureAccess};
    use sdl_video::video::{VideoDevice, WindowFlags, WindowId};
    use sdl_video::{Color, DisplayMode, PixelFormat, Rect, VideoError};

    #[derive(Debug, Clone)]
    enum IdOp {
        CreateWindow,
        DestroyWindow(usize),
        CreateTexture,
        DestroyTexture(usize),
    }

    fn id_op() -> impl Strategy<Value = IdOp> {
        prop_oneof![
            Just(IdOp::CreateWindow),
            any::<usize>().prop_map(IdOp::DestroyWindow),
            Just(IdOp::CreateTexture),
            any::<usize>().prop_map(IdOp::DestroyTexture),
        ]
    }

    #[derive(Debug, Clone)]
    enum WindowOp {
        Create { fullscreen: bool, shown: bool },
        Show(usize),
        Hide(usize),
        Minimize(usize),
        Maximize(usize),
        Restore(usize),
        Fullscreen(usize, bool),
        FocusGained(usize),
        FocusLost(usize),
        Destroy(usize),
    }

    fn window_op() -> impl Strategy<Value = WindowOp> {
        prop_oneof![
            (any::<bool>(), any::<bool>())
                .prop_map(|(fullscreen, shown)| WindowOp::Create { fullscreen, shown }),
            any::<usize>().prop_map(WindowOp::Show),
            any::<usize>().prop_map(WindowOp::Hide),
            any::<usize>().prop_map(WindowOp::Minimize),
            any::<usize>().prop_map(WindowOp::Maximize),
            any::<usize>().prop_map(WindowOp::Restore),
            (any::<usize>(), any::<bool>()).prop_map(|(i, on)| WindowOp::Fullscreen(i, on)),
            any::<usize>().prop_map(WindowOp::FocusGained),
            any::<usize>().prop_map(WindowOp::FocusLost),
            any::<usize>().prop_map(WindowOp::Destroy),
        ]
    }

    fn coordinate() -> impl Strategy<Value = i32> {
        prop_oneof![
            Just(i32::MIN),
            Just(i32::MAX),
            Just(i32::MAX - 1),
            -8..8i32,
            any::<i32>(),
        ]
    }

    fn any_rect() -> impl Strategy<Value = Rect> {
        (coordinate(), coordinate(), coordinate(), coordinate())
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    fn inside_4x4(rect: &Rect) -> bool {
        !rect.is_empty() && Rect::new(0, 0, 4, 4).encloses(rect)
    }

    fn pick(ids: &[WindowId], index: usize) -> Option<WindowId> {
        (!ids.is_empty()).then(|| ids[index % ids.len()])
    }

    fn visible_fullscreen_count(device: &VideoDevice) -> usize {
        device
            .displays()
            .iter()
            .map(|display| {
                display
                    .windows()
                    .filter(|window| window.is_fullscreen_visible())
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    proptest! {
        #[test]
        fn ids_are_never_reused(ops in prop::collection::vec(id_op(), 1..40)) {
            let mut h = harness();
            let base = h.device.create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN).unwrap();
            h.device.create_renderer(base, None, RendererFlags::empty()).unwrap();

            let mut seen: HashSet<u32> = HashSet::from([base]);
            let mut windows: Vec<WindowId> = Vec::new();
            let mut textures: Vec<u32> = Vec::new();

            for op in ops {
                match op {
                    IdOp::CreateWindow => {
                        let id = h.device.create_window(None, 0, 0, 32, 32, WindowFlags::empty()).unwrap();
                        prop_assert_ne!(id, 0);
                        prop_assert!(seen.insert(id), "window id {} reused", id);
                        windows.push(id);
                    }
                    IdOp::DestroyWindow(i) => {
                        if !windows.is_empty() {
                            let id = windows.remove(i % windows.len());
                            h.device.destroy_window(id).unwrap();
                        }
                    }
                    IdOp::CreateTexture => {
                        let id = h.device
                            .create_texture(PixelFormat::RGB888, TextureAccess::Static, 4, 4)
                            .unwrap();
                        prop_assert_ne!(id, 0);
                        prop_assert!(seen.insert(id), "texture id {} reused", id);
                        textures.push(id);
                    }
                    IdOp::DestroyTexture(i) => {
                        if !textures.is_empty() {
                            let id = textures.remove(i % textures.len());
                            h.device.destroy_texture(id).unwrap();
                            prop_assert!(h.device.texture(id).is_none());
                        }
                    }
                }
            }
        }

        #[test]
        fn at_most_one_visible_fullscreen_window(ops in prop::collection::vec(window_op(), 1..40)) {
            let mut h = harness();
            let mut ids: Vec<WindowId> = Vec::new();

            for op in ops {
                match op {
                    WindowOp::Create { fullscreen, shown } => {
                        let mut flags = WindowFlags::empty();
                        flags.set(WindowFlags::FULLSCREEN, fullscreen);
                        flags.set(WindowFlags::SHOWN, shown);
                        ids.push(h.device.create_window(None, 0, 0, 320, 200, flags).unwrap());
                    }
                    WindowOp::Show(i) => if let Some(id) = pick(&ids, i) {
                        h.device.show_window(id).unwrap();
                    },
                    WindowOp::Hide(i) => if let Some(id) = pick(&ids, i) {
                        h.device.hide_window(id).unwrap();
                    },
                    WindowOp::Minimize(i) => if let Some(id) = pick(&ids, i) {
                        h.device.minimize_window(id).unwrap();
                    },
                    WindowOp::Maximize(i) => if let Some(id) = pick(&ids, i) {
                        h.device.maximize_window(id).unwrap();
                    },
                    WindowOp::Restore(i) => if let Some(id) = pick(&ids, i) {
                        h.device.restore_window(id).unwrap();
                    },
                    WindowOp::Fullscreen(i, on) => if let Some(id) = pick(&ids, i) {
                        h.device.set_window_fullscreen(id, on).unwrap();
                    },
                    WindowOp::FocusGained(i) => if let Some(id) = pick(&ids, i) {
                        h.device.send_window_event(id, WindowEventKind::FocusGained, 0, 0);
                    },
                    WindowOp::FocusLost(i) => if let Some(id) = pick(&ids, i) {
                        h.device.send_window_event(id, WindowEventKind::FocusLost, 0, 0);
                    },
                    WindowOp::Destroy(i) => {
                        if !ids.is_empty() {
                            let id = ids.remove(i % ids.len());
                            h.device.destroy_window(id).unwrap();
                        }
                    }
                }
                prop_assert!(visible_fullscreen_count(&h.device) <= 1);
            }
        }

        #[test]
        fn adding_a_mode_twice_is_idempotent(w in 1..4096i32, h in 1..4096i32, refresh in 0..240i32, deep in any::<bool>()) {
            let mut harness = harness();
            harness.device.num_display_modes();
            let format = if deep { PixelFormat::RGB888 } else { PixelFormat::RGB565 };
            let extra = mode(format, w, h, refresh);

            let display = harness.device.displays_mut().get_mut(0).unwrap();
            display.add_display_mode(extra.clone());
            let once = harness.device.num_display_modes();

            let display = harness.device.displays_mut().get_mut(0).unwrap();
            prop_assert!(!display.add_display_mode(extra));
            prop_assert_eq!(harness.device.num_display_modes(), once);
        }

        #[test]
        fn set_mode_lands_on_the_closest_match(w in 0..1200i32, h in 0..900i32, refresh in prop::sample::select(vec![0, 60, 75])) {
            let mut harness = harness();
            let request = DisplayMode::new(PixelFormat::UNKNOWN, w, h, refresh);
            let current = harness.device.current_display_mode().unwrap().clone();
            let expected = harness.device.closest_display_mode(&request.or_defaults(&current));

            match expected {
                Some(expected) => {
                    harness.device.set_display_mode(Some(&request)).unwrap();
                    prop_assert_eq!(harness.device.current_display_mode().unwrap(), &expected);
                }
                None => prop_assert!(harness.device.set_display_mode(Some(&request)).is_err()),
            }
        }

        #[test]
        fn draw_calls_never_panic_on_any_rect(rects in prop::collection::vec(any_rect(), 1..8), stretch in any::<bool>()) {
            let mut h = harness();
            let window = h.device.create_window(None, 0, 0, 4, 4, WindowFlags::SHOWN).unwrap();
            h.device.create_renderer(window, None, RendererFlags::empty()).unwrap();
            let texture = h.device
                .create_texture(PixelFormat::ARGB8888, TextureAccess::Streaming, 3, 3)
                .unwrap();
            let scale = if stretch { ScaleMode::FAST } else { ScaleMode::NONE };
            let mut buffer = [0u8; 64];

            for rect in &rects {
                let read = h.device.render_read_pixels(Some(rect), &mut buffer, 16);
                let write = h.device.render_write_pixels(Some(rect), &buffer, 16);
                if inside_4x4(rect) {
                    prop_assert!(read.is_ok());
                    prop_assert!(write.is_ok());
                } else {
                    prop_assert_eq!(read, Err(VideoError::InvalidParam("rect")));
                    prop_assert_eq!(write, Err(VideoError::InvalidParam("rect")));
                }

                prop_assert!(h.device.render_fill(Some(rect), Color::rgb(1, 2, 3)).is_ok());
                prop_assert!(h.device
                    .render_copy(texture, Some(rect), None, BlendMode::BLEND, scale)
                    .is_ok());
                prop_assert!(h.device
                    .render_copy(texture, None, Some(rect), BlendMode::NONE, scale)
                    .is_ok());
            }
            prop_assert!(h.device.render_present().is_ok());
        }

        #[test]
        fn removing_a_window_keeps_the_others(n in 1..8usize, k in any::<usize>()) {
            let mut h = harness();
            let ids: Vec<WindowId> = (0..n)
                .map(|_| h.device.create_window(None, 0, 0, 10, 10, WindowFlags::empty()).unwrap())
                .collect();
            let victim = ids[k % n];

            h.device.destroy_window(victim).unwrap();

            prop_assert_eq!(h.device.displays().get(0).unwrap().num_windows(), n - 1);
            prop_assert!(h.device.window(victim).is_none());
            for id in ids.iter().copied().filter(|id| *id != victim) {
                prop_assert_eq!(h.device.window(id).map(|window| window.id()), Some(id));
            }
        }
    }

    #[test]
    fn test_destroy_renderer_drops_only_its_textures() {
        let mut h = harness();
        let first = h.device.create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN).unwrap();
        let second = h.device.create_window(None, 0, 0, 64, 64, WindowFlags::SHOWN).unwrap();

        h.device.create_renderer(first, None, RendererFlags::empty()).unwrap();
        let owned: Vec<u32> = (0..70)
            .map(|_| {
                h.device
                    .create_texture(PixelFormat::RGB565, TextureAccess::Static, 2, 2)
                    .unwrap()
            })
            .collect();

        h.device.create_renderer(second, None, RendererFlags::empty()).unwrap();
        let kept: Vec<u32> = (0..5)
            .map(|_| {
                h.device
                    .create_texture(PixelFormat::RGB565, TextureAccess::Static, 2, 2)
                    .unwrap()
            })
            .collect();

        h.device.destroy_renderer(first).unwrap();

        for id in owned {
            assert!(h.device.texture(id).is_none(), "texture {} survived", id);
        }
        for id in &kept {
            assert!(h.device.texture(*id).is_some());
        }
        assert_eq!(h.device.displays().get(0).unwrap().textures().len(), kept.len());
        assert_eq!(h.device.current_renderer(), Some(second));
    }
}
