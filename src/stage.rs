use std::cell::Cell;

use pdf_writer::Content;

/// Off-screen drawing area owned by one generation call.
///
/// Blocks and captured views are drawn onto a [`Mount`] before they become
/// XObjects. A mount is attached while the guard lives and detached when it is
/// dropped, so every exit path (including `?` on errors) releases it.
pub(crate) struct Stage {
    live: Cell<usize>,
    peak: Cell<usize>,
}

impl Stage {
    pub(crate) fn new() -> Self {
        Self {
            live: Cell::new(0),
            peak: Cell::new(0),
        }
    }

    pub(crate) fn mount(&self, label: &'static str, width: f32) -> Mount<'_> {
        let live = self.live.get() + 1;
        self.live.set(live);
        self.peak.set(self.peak.get().max(live));
        log::trace!("stage: mount {label} width={width:.1} (live={live})");
        Mount {
            stage: self,
            label,
            content: Content::new(),
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.live.get()
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.get()
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        if self.live.get() > 0 {
            log::warn!("stage dropped with {} mounts still attached", self.live.get());
        }
    }
}

pub(crate) struct Mount<'a> {
    stage: &'a Stage,
    label: &'static str,
    pub(crate) content: Content,
}

impl Mount<'_> {
    /// Take the drawn operations; the mount is detached as it goes out of scope.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        let content = std::mem::replace(&mut self.content, Content::new());
        content.finish().as_slice().to_vec()
    }
}

impl Drop for Mount<'_> {
    fn drop(&mut self) {
        let live = self.stage.live.get().saturating_sub(1);
        self.stage.live.set(live);
        log::trace!("stage: detach {} (live={live})", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rasterize(fail: bool) -> Result<(), String> {
        if fail { Err("rasterization failed".to_string()) } else { Ok(()) }
    }

    fn draw_then_fail(stage: &Stage) -> Result<Vec<u8>, String> {
        let mut mount = stage.mount("failing", 100.0);
        mount.content.rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(stage.live(), 1);
        rasterize(true)?;
        Ok(mount.finish())
    }

    #[test]
    fn mount_detaches_on_error_path() {
        let stage = Stage::new();
        assert!(draw_then_fail(&stage).is_err());
        assert_eq!(stage.live(), 0);
    }

    #[test]
    fn sequential_mounts_never_overlap() {
        let stage = Stage::new();
        for _ in 0..3 {
            let mount = stage.mount("block", 50.0);
            let _ = mount.finish();
        }
        assert_eq!(stage.live(), 0);
        assert_eq!(stage.peak(), 1);
    }
}
