//! Texture swapping: owns the scene and applies finished loads to it.
//!
//! A swap is split in two halves. [`SwapController::request`] (or
//! [`SwapController::dispatch`], which also starts the load) hands out a
//! ticket; the load result comes back later through
//! [`SwapController::complete`] on the thread that owns the controller.
//! Tickets grow monotonically and only the newest ticket per surface may
//! bind its texture, so a slow load finishing after a newer request is
//! dropped instead of overwriting it.

use std::path::Path;

use asset::{AssetError, AssetResult, LoadRequest, Texture, TextureId, TextureLoader, TextureSource};

use crate::config::RoomConfig;
use crate::scene::{SceneState, SurfaceKind};

/// Identifies one requested swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwapTicket {
    pub surface: SurfaceKind,
    seq: u64,
}

impl SwapTicket {
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// What [`SwapController::complete`] did with a finished load.
#[derive(Debug)]
pub enum SwapOutcome {
    /// The texture is now bound to the surface.
    Applied(TextureId),
    /// A newer swap was requested for the surface meanwhile; result dropped.
    Stale,
    /// Load failed (after any fallback); the previous texture stays.
    Failed(AssetError),
}

impl SwapOutcome {
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

pub struct SwapController {
    scene: SceneState,
    next_seq: u64,
    newest: [Option<u64>; 3],
    redraw: bool,
}

impl SwapController {
    pub fn new(scene: SceneState) -> Self {
        Self {
            scene,
            next_seq: 1,
            newest: [None; 3],
            redraw: true,
        }
    }

    #[inline]
    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut SceneState {
        &mut self.scene
    }

    /// Register a swap for `surface`; any older ticket for it becomes stale.
    pub fn request(&mut self, surface: SurfaceKind) -> SwapTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.newest[surface.index()] = Some(seq);
        SwapTicket { surface, seq }
    }

    /// Whether some swap for `surface` has been requested but not completed.
    pub fn is_pending(&self, surface: SurfaceKind) -> bool {
        self.newest[surface.index()].is_some()
    }

    /// Forget a ticket whose load will never complete. Only clears the
    /// surface if no newer swap was requested since.
    pub fn abandon(&mut self, ticket: SwapTicket) {
        let slot = &mut self.newest[ticket.surface.index()];
        if *slot == Some(ticket.seq) {
            *slot = None;
        }
    }

    /// Request a swap and start loading it on a worker thread. `deliver`
    /// runs on that worker and must get `(ticket, result)` back to whoever
    /// calls [`Self::complete`].
    pub fn dispatch<F>(
        &mut self,
        loader: &TextureLoader,
        surface: SurfaceKind,
        request: LoadRequest,
        deliver: F,
    ) -> AssetResult<SwapTicket>
    where
        F: FnOnce(SwapTicket, AssetResult<Texture>) + Send + 'static,
    {
        let ticket = self.request(surface);
        log::info!(
            "Swap #{} requested for {}: {}",
            ticket.seq,
            surface,
            request.primary.label()
        );
        if let Err(err) = loader.spawn(request, move |result| deliver(ticket, result)) {
            self.abandon(ticket);
            return Err(err);
        }
        Ok(ticket)
    }

    /// Encode an image file as a data URL and swap it onto `surface`.
    pub fn import_file<F>(
        &mut self,
        loader: &TextureLoader,
        surface: SurfaceKind,
        path: &Path,
        deliver: F,
    ) -> AssetResult<SwapTicket>
    where
        F: FnOnce(SwapTicket, AssetResult<Texture>) + Send + 'static,
    {
        let url = asset::data_url::from_file(path)?;
        let request = LoadRequest::new(TextureSource::data_url(url));
        self.dispatch(loader, surface, request, deliver)
    }

    /// Start loading the configured default texture of every surface.
    pub fn load_defaults<F>(&mut self, loader: &TextureLoader, config: &RoomConfig, deliver: F)
    where
        F: Fn(SwapTicket, AssetResult<Texture>) + Clone + Send + 'static,
    {
        for kind in SurfaceKind::ALL {
            let request = config.default_for(kind).clone();
            if let Err(err) = self.dispatch(loader, kind, request, deliver.clone()) {
                log::error!("Default texture for {kind} not loaded: {err}");
            }
        }
    }

    /// Apply a finished load.
    pub fn complete(&mut self, ticket: SwapTicket, result: AssetResult<Texture>) -> SwapOutcome {
        let slot = &mut self.newest[ticket.surface.index()];
        if *slot != Some(ticket.seq) {
            log::debug!(
                "Dropping stale swap #{} for {} (newest is {:?})",
                ticket.seq,
                ticket.surface,
                slot
            );
            return SwapOutcome::Stale;
        }
        *slot = None;

        match result {
            Ok(texture) => {
                let id = texture.id();
                log::info!(
                    "{} now shows {}",
                    ticket.surface,
                    texture.source().label()
                );
                self.scene.bind_texture(ticket.surface, texture);
                self.redraw = true;
                SwapOutcome::Applied(id)
            }
            Err(err) => {
                log::warn!(
                    "Texture for {} failed to load, keeping the current one: {err}",
                    ticket.surface
                );
                SwapOutcome::Failed(err)
            }
        }
    }

    /// Forward a viewport change to the scene.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.scene.resize(width, height);
        self.redraw = true;
    }

    /// Consume the pending "render now" request.
    #[inline]
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Duration;

    use asset::MemoryFetcher;

    fn png(rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn fixture() -> (Arc<MemoryFetcher>, TextureLoader, SwapController) {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert("oak.png", png([120, 80, 40, 255]));
        fetcher.insert("marble.png", png([240, 240, 240, 255]));
        fetcher.insert("slate.png", png([40, 40, 50, 255]));
        let loader = TextureLoader::new(fetcher.clone());
        let controller = SwapController::new(SceneState::new(800, 600));
        (fetcher, loader, controller)
    }

    fn texture_ids(c: &SwapController) -> Vec<TextureId> {
        c.scene().surfaces().map(|s| s.texture().id()).collect()
    }

    /// Blocking stand-in for the event loop round trip.
    fn swap_now(
        c: &mut SwapController,
        loader: &TextureLoader,
        kind: SurfaceKind,
        request: LoadRequest,
    ) -> SwapOutcome {
        let ticket = c.request(kind);
        let result = loader.load_with_fallback(&request);
        c.complete(ticket, result)
    }

    #[test]
    fn swap_binds_new_texture_to_target_only() {
        let (_, loader, mut c) = fixture();
        let before = texture_ids(&c);

        let outcome = swap_now(
            &mut c,
            &loader,
            SurfaceKind::FrontWall,
            LoadRequest::new(TextureSource::asset("marble.png")),
        );
        let SwapOutcome::Applied(id) = &outcome else {
            panic!("expected Applied, got {outcome:?}");
        };

        let after = texture_ids(&c);
        assert_eq!(after[1], *id);
        assert_ne!(after[1], before[1]);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        let wall = c.scene().surface(SurfaceKind::FrontWall);
        assert_eq!(wall.texture().source(), &TextureSource::asset("marble.png"));
        assert!(wall.material.needs_update());
    }

    #[test]
    fn abandoned_ticket_clears_pending_and_keeps_texture() {
        let (_, loader, mut c) = fixture();
        let before = texture_ids(&c);

        let older = c.request(SurfaceKind::LeftWall);
        let newer = c.request(SurfaceKind::LeftWall);
        c.abandon(older);
        assert!(c.is_pending(SurfaceKind::LeftWall));

        c.abandon(newer);
        assert!(!c.is_pending(SurfaceKind::LeftWall));
        let late = loader.load(&TextureSource::asset("oak.png"));
        assert!(matches!(c.complete(older, late), SwapOutcome::Stale));
        assert_eq!(texture_ids(&c), before);
    }

    #[test]
    fn unreachable_source_with_fallback_binds_fallback() {
        let (_, loader, mut c) = fixture();
        swap_now(
            &mut c,
            &loader,
            SurfaceKind::Floor,
            LoadRequest::new(TextureSource::asset("oak.png")),
        );

        let outcome = swap_now(
            &mut c,
            &loader,
            SurfaceKind::Floor,
            LoadRequest::new(TextureSource::asset("missing.png"))
                .with_fallback(TextureSource::asset("slate.png")),
        );
        assert!(outcome.is_applied());
        assert_eq!(
            c.scene().surface(SurfaceKind::Floor).texture().source(),
            &TextureSource::asset("slate.png")
        );
    }

    #[test]
    fn unreachable_source_without_fallback_keeps_previous() {
        let (_, loader, mut c) = fixture();
        swap_now(
            &mut c,
            &loader,
            SurfaceKind::LeftWall,
            LoadRequest::new(TextureSource::asset("oak.png")),
        );
        let before = texture_ids(&c);
        c.take_redraw_request();

        let outcome = swap_now(
            &mut c,
            &loader,
            SurfaceKind::LeftWall,
            LoadRequest::new(TextureSource::asset("missing.png")),
        );
        assert!(matches!(outcome, SwapOutcome::Failed(AssetError::NotFound(_))));
        assert_eq!(texture_ids(&c), before);
        assert!(!c.take_redraw_request());
    }

    #[test]
    fn same_image_twice_yields_fresh_texture() {
        let (_, loader, mut c) = fixture();
        let request = LoadRequest::new(TextureSource::asset("oak.png"));
        swap_now(&mut c, &loader, SurfaceKind::Floor, request.clone());
        let first = c.scene().surface(SurfaceKind::Floor).texture().id();
        swap_now(&mut c, &loader, SurfaceKind::Floor, request);
        let second = c.scene().surface(SurfaceKind::Floor).texture().id();
        assert_ne!(first, second);
    }

    #[test]
    fn older_completion_is_discarded() {
        let (_, loader, mut c) = fixture();
        let older = c.request(SurfaceKind::Floor);
        let newer = c.request(SurfaceKind::Floor);
        assert!(newer.seq() > older.seq());

        let slate = loader.load(&TextureSource::asset("slate.png")).unwrap();
        let slate_id = slate.id();
        assert!(c.complete(newer, Ok(slate)).is_applied());

        // The older load finishes last but must not win.
        let oak = loader.load(&TextureSource::asset("oak.png")).unwrap();
        assert!(matches!(c.complete(older, Ok(oak)), SwapOutcome::Stale));
        assert_eq!(c.scene().surface(SurfaceKind::Floor).texture().id(), slate_id);
    }

    #[test]
    fn tickets_for_other_surfaces_do_not_interfere() {
        let (_, loader, mut c) = fixture();
        let floor = c.request(SurfaceKind::Floor);
        let wall = c.request(SurfaceKind::FrontWall);
        assert!(c.is_pending(SurfaceKind::Floor));

        let oak = loader.load(&TextureSource::asset("oak.png")).unwrap();
        assert!(c.complete(floor, Ok(oak)).is_applied());
        assert!(!c.is_pending(SurfaceKind::Floor));
        let marble = loader.load(&TextureSource::asset("marble.png")).unwrap();
        assert!(c.complete(wall, Ok(marble)).is_applied());
    }

    #[test]
    fn defaults_fall_back_then_stay_placeholder() {
        let (_, loader, mut c) = fixture();
        let config = RoomConfig::default()
            .with_default(
                SurfaceKind::Floor,
                LoadRequest::new(TextureSource::asset("oak.png")),
            )
            .with_default(
                SurfaceKind::FrontWall,
                LoadRequest::new(TextureSource::asset("missing.png"))
                    .with_fallback(TextureSource::asset("marble.png")),
            )
            .with_default(
                SurfaceKind::LeftWall,
                LoadRequest::new(TextureSource::asset("missing.png"))
                    .with_fallback(TextureSource::asset("also-missing.png")),
            );
        let placeholder_left = c.scene().surface(SurfaceKind::LeftWall).texture().id();

        let (tx, rx) = mpsc::channel();
        c.load_defaults(&loader, &config, move |ticket, result| {
            let _ = tx.send((ticket, result));
        });
        for _ in 0..3 {
            let (ticket, result) = rx.recv_timeout(Duration::from_secs(10)).expect("completion");
            c.complete(ticket, result);
        }

        let scene = c.scene();
        assert_eq!(
            scene.surface(SurfaceKind::Floor).texture().source(),
            &TextureSource::asset("oak.png")
        );
        assert_eq!(
            scene.surface(SurfaceKind::FrontWall).texture().source(),
            &TextureSource::asset("marble.png")
        );
        assert_eq!(scene.surface(SurfaceKind::LeftWall).texture().id(), placeholder_left);
    }

    #[test]
    fn import_binds_data_url_texture_to_chosen_target() {
        let (_, loader, mut c) = fixture();
        let dir = std::env::temp_dir().join(format!("roomviz-import-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let file = dir.join("upload.png");
        std::fs::write(&file, png([10, 200, 30, 255])).expect("write");
        let before = texture_ids(&c);

        let (tx, rx) = mpsc::channel();
        let ticket = c
            .import_file(&loader, SurfaceKind::LeftWall, &file, move |ticket, result| {
                let _ = tx.send((ticket, result));
            })
            .expect("import");
        assert_eq!(ticket.surface, SurfaceKind::LeftWall);

        let (ticket, result) = rx.recv_timeout(Duration::from_secs(10)).expect("completion");
        assert!(c.complete(ticket, result).is_applied());

        let after = texture_ids(&c);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
        let left = c.scene().surface(SurfaceKind::LeftWall).texture();
        assert!(left.source().is_data_url());
        assert_eq!(&left.base().data[..4], &[10, 200, 30, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn import_of_non_image_file_is_refused() {
        let (_, loader, mut c) = fixture();
        let err = c
            .import_file(
                &loader,
                SurfaceKind::Floor,
                Path::new("/tmp/notes.txt"),
                |_, _| {},
            )
            .unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedMedia(_)));
        assert!(!c.is_pending(SurfaceKind::Floor));
    }

    #[test]
    fn resize_requests_redraw_and_keeps_textures() {
        let (_, _, mut c) = fixture();
        c.take_redraw_request();
        let before = texture_ids(&c);
        c.resize(1024, 512);
        assert!(c.take_redraw_request());
        assert_eq!(c.scene().camera.aspect, 2.0);
        assert_eq!(texture_ids(&c), before);
    }
}
