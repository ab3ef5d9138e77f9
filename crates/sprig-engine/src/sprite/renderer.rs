use std::rc::Rc;

use glam::Mat4;

use crate::coords::{SharedTransform, Viewport};
use crate::device::{DrawCall, GpuDevice};
use crate::pipeline::PipelineCache;
use crate::RenderError;

use super::{ortho_projection, GraphicArena, GraphicId, RenderList, Sprite, SpriteGraphic};

/// Owns sprite graphics and draws the registered ones in insertion order.
pub struct SpriteRenderer<B: GpuDevice> {
    viewport: Viewport,
    projection: Mat4,
    graphics: GraphicArena<SpriteGraphic<B>>,
    render_list: RenderList,
}

impl<B: GpuDevice> SpriteRenderer<B> {
    /// Fixes the projection for `viewport` and the device's NDC convention.
    pub fn new(device: &B, viewport: Viewport) -> Self {
        Self {
            viewport,
            projection: ortho_projection(viewport, device.ndc_y_axis()),
            graphics: GraphicArena::new(),
            render_list: RenderList::new(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Creates a graphic for `sprite` and appends it to the render list.
    pub fn spawn(
        &mut self,
        device: &mut B,
        sprite: Rc<Sprite<B>>,
        transform: SharedTransform,
    ) -> Result<GraphicId, RenderError> {
        let graphic = SpriteGraphic::new(device, sprite, transform)?;
        let id = self.insert(graphic);
        self.add_to_render_list(id);
        Ok(id)
    }

    /// Takes ownership of a graphic without registering it for drawing.
    pub fn insert(&mut self, graphic: SpriteGraphic<B>) -> GraphicId {
        self.graphics.insert(graphic)
    }

    /// Deregisters and releases a graphic. Returns `false` for stale handles.
    pub fn despawn(&mut self, device: &mut B, id: GraphicId) -> bool {
        self.render_list.remove(id);
        match self.graphics.remove(id) {
            Some(mut graphic) => {
                graphic.release(device);
                true
            }
            None => false,
        }
    }

    pub fn add_to_render_list(&mut self, id: GraphicId) {
        debug_assert!(self.graphics.contains(id), "{id:?} is not owned by this renderer");
        self.render_list.push(id);
    }

    pub fn remove_from_render_list(&mut self, id: GraphicId) -> bool {
        self.render_list.remove(id)
    }

    pub fn is_registered(&self, id: GraphicId) -> bool {
        self.render_list.contains(id)
    }

    pub fn graphic(&self, id: GraphicId) -> Option<&SpriteGraphic<B>> {
        self.graphics.get(id)
    }

    pub fn graphic_mut(&mut self, id: GraphicId) -> Option<&mut SpriteGraphic<B>> {
        self.graphics.get_mut(id)
    }

    pub fn render_list(&self) -> impl Iterator<Item = GraphicId> + '_ {
        self.render_list.iter()
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    /// Uploads uniforms for the current frame slot and records one draw per
    /// registered graphic.
    ///
    /// Opens and closes a frame itself when none is open; if recording fails
    /// in such a frame, the frame is abandoned.
    pub fn render(&self, device: &mut B, pipelines: &PipelineCache<B>) -> Result<(), RenderError> {
        let self_started = !device.in_frame();
        if self_started {
            device.begin_frame()?;
        }

        match self.record(device, pipelines) {
            Ok(()) if self_started => Ok(device.end_frame()?),
            Ok(()) => Ok(()),
            Err(e) => {
                if self_started {
                    device.abandon_frame();
                }
                Err(e)
            }
        }
    }

    fn record(&self, device: &mut B, pipelines: &PipelineCache<B>) -> Result<(), RenderError> {
        let slot = device.current_frame();
        debug_assert!(slot < device.frames_in_flight(), "frame slot {slot} out of range");

        let mut draws = Vec::with_capacity(self.render_list.len());
        for id in self.render_list.iter() {
            let Some(graphic) = self.graphics.get(id) else {
                debug_assert!(false, "render list holds stale {id:?}");
                continue;
            };
            graphic.update_uniforms(device, slot, &self.projection);

            let sprite = graphic.sprite();
            let mesh = sprite.mesh();
            draws.push(DrawCall {
                pipeline: pipelines.pipeline(sprite.pipeline()),
                pipeline_layout: sprite.layout().pipeline_layout(),
                vertex_buffer: &mesh.vertex_buffer,
                index_buffer: &mesh.index_buffer,
                index_count: mesh.index_count,
                descriptor_set: graphic.descriptor_set(slot),
            });
        }

        device.record_draws(&draws)?;
        Ok(())
    }

    /// Releases every graphic and clears the render list.
    pub fn deinit(&mut self, device: &mut B) {
        self.render_list.clear();
        for mut graphic in self.graphics.drain() {
            graphic.release(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceError, Extent2D, NdcYAxis};
    use crate::sprite::test_support::{transform_at, Fixture};
    use crate::sprite::SpriteUniforms;
    use crate::NameKey;

    fn renderer(fx: &Fixture) -> SpriteRenderer<crate::sprite::test_support::Dev> {
        SpriteRenderer::new(&fx.dev, Viewport::new(800.0, 600.0))
    }

    #[test]
    fn draws_follow_insertion_order_and_skip_removed() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");

        let a = r.spawn(&mut fx.dev, Rc::clone(&sprite), transform_at(0.0, 0.0)).unwrap();
        let b = r.spawn(&mut fx.dev, Rc::clone(&sprite), transform_at(1.0, 0.0)).unwrap();
        let c = r.spawn(&mut fx.dev, Rc::clone(&sprite), transform_at(2.0, 0.0)).unwrap();

        r.render(&mut fx.dev, &fx.pipelines).unwrap();
        assert_eq!(fx.dev.draws.len(), 3);

        assert!(r.remove_from_render_list(b));
        fx.dev.draws.clear();
        r.render(&mut fx.dev, &fx.pipelines).unwrap();

        let slot = 1;
        let sets: Vec<_> = fx.dev.draws.iter().map(|d| d.descriptor_set).collect();
        assert_eq!(
            sets,
            vec![
                *r.graphic(a).unwrap().descriptor_set(slot),
                *r.graphic(c).unwrap().descriptor_set(slot)
            ]
        );
        assert!(fx.dev.draws.iter().all(|d| d.frame == slot));
        assert!(r.graphic(b).is_some());

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn each_draw_binds_the_sprite_resources() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.textured("tile");
        let id = r.spawn(&mut fx.dev, Rc::clone(&sprite), transform_at(5.0, 5.0)).unwrap();

        r.render(&mut fx.dev, &fx.pipelines).unwrap();

        let d = &fx.dev.draws[0];
        assert_eq!(d.pipeline, *fx.pipelines.pipeline(NameKey::new("textured")));
        assert_eq!(d.pipeline_layout, *fx.textured_layout.pipeline_layout());
        assert_eq!(d.vertex_buffer, sprite.mesh().vertex_buffer);
        assert_eq!(d.index_buffer, sprite.mesh().index_buffer);
        assert_eq!(d.index_count, 6);
        assert_eq!(d.descriptor_set, *r.graphic(id).unwrap().descriptor_set(0));

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn self_started_frames_rotate_slots() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        r.spawn(&mut fx.dev, sprite, transform_at(0.0, 0.0)).unwrap();

        for _ in 0..3 {
            r.render(&mut fx.dev, &fx.pipelines).unwrap();
        }
        assert_eq!(fx.dev.frames_begun, 3);
        assert_eq!(fx.dev.frames_ended, 3);
        let frames: Vec<usize> = fx.dev.draws.iter().map(|d| d.frame).collect();
        assert_eq!(frames, vec![0, 1, 0]);

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn open_frames_are_left_open() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        r.spawn(&mut fx.dev, sprite, transform_at(0.0, 0.0)).unwrap();

        fx.dev.begin_frame().unwrap();
        r.render(&mut fx.dev, &fx.pipelines).unwrap();
        assert!(fx.dev.in_frame());
        assert_eq!(fx.dev.frames_ended, 0);
        fx.dev.end_frame().unwrap();

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn recording_failure_abandons_self_started_frame() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        r.spawn(&mut fx.dev, sprite, transform_at(0.0, 0.0)).unwrap();

        fx.dev.fail.record = true;
        let err = r.render(&mut fx.dev, &fx.pipelines).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(fx.dev.frames_abandoned, 1);
        assert!(!fx.dev.in_frame());
        assert_eq!(fx.dev.current_frame, 0);

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn skipped_frame_is_reported_without_drawing() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        r.spawn(&mut fx.dev, sprite, transform_at(0.0, 0.0)).unwrap();

        fx.dev.fail.begin_frame = true;
        let err = r.render(&mut fx.dev, &fx.pipelines).unwrap_err();
        assert!(matches!(err, RenderError::Device(DeviceError::FrameSkipped(_))));
        assert!(fx.dev.draws.is_empty());

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn uniforms_carry_the_renderer_projection() {
        let mut fx = Fixture::new();
        fx.dev.ndc = NdcYAxis::Up;
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        let id = r.spawn(&mut fx.dev, sprite, transform_at(3.0, 4.0)).unwrap();

        r.render(&mut fx.dev, &fx.pipelines).unwrap();

        let set = *r.graphic(id).unwrap().descriptor_set(0);
        let buffer = fx.dev.descriptor_sets[&set][0].resource;
        let u: SpriteUniforms = bytemuck::pod_read_unaligned(&fx.dev.contents(buffer));
        assert_eq!(u.projection, r.projection().to_cols_array_2d());
        assert_eq!(u.projection[1][1], -2.0 / 600.0);
        assert_eq!(u.model[3][0], 3.0);
        assert_eq!(u.model[3][1], 4.0);

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn despawn_releases_and_invalidates_the_handle() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        let buffers_before = fx.dev.live_buffers();
        let id = r.spawn(&mut fx.dev, sprite, transform_at(0.0, 0.0)).unwrap();

        assert!(r.despawn(&mut fx.dev, id));
        assert!(!r.despawn(&mut fx.dev, id));
        assert!(r.graphic(id).is_none());
        assert!(!r.is_registered(id));
        assert_eq!(fx.dev.live_buffers(), buffers_before);

        r.render(&mut fx.dev, &fx.pipelines).unwrap();
        assert!(fx.dev.draws.is_empty());
    }

    #[test]
    fn inserted_graphics_draw_only_once_registered() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        let graphic = SpriteGraphic::new(&mut fx.dev, sprite, transform_at(0.0, 0.0))
            .unwrap();
        let id = r.insert(graphic);

        r.render(&mut fx.dev, &fx.pipelines).unwrap();
        assert!(fx.dev.draws.is_empty());

        r.add_to_render_list(id);
        r.render(&mut fx.dev, &fx.pipelines).unwrap();
        assert_eq!(fx.dev.draws.len(), 1);

        r.deinit(&mut fx.dev);
    }

    #[test]
    fn deinit_releases_everything() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.textured("tile");
        let before = fx.dev.live_buffers();
        for i in 0..4 {
            r.spawn(&mut fx.dev, Rc::clone(&sprite), transform_at(i as f32, 0.0)).unwrap();
        }
        assert_eq!(fx.dev.live_buffers(), before + 8);

        r.deinit(&mut fx.dev);
        assert!(r.is_empty());
        assert_eq!(r.render_list().count(), 0);
        assert_eq!(fx.dev.live_buffers(), before);
        assert!(fx.dev.descriptor_sets.is_empty());
    }

    #[test]
    fn resized_pipelines_are_drawn_after_rebuild() {
        let mut fx = Fixture::new();
        let mut r = renderer(&fx);
        let sprite = fx.flat("block");
        r.spawn(&mut fx.dev, sprite, transform_at(0.0, 0.0)).unwrap();

        fx.dev.extent = Extent2D::new(1280, 720);
        fx.pipelines.invalidate(fx.dev.extent);
        fx.pipelines.rebuild_stale(&mut fx.dev).unwrap();
        r.render(&mut fx.dev, &fx.pipelines).unwrap();

        let drawn = fx.dev.pipeline(fx.dev.draws[0].pipeline);
        assert_eq!(drawn.state.extent, Extent2D::new(1280, 720));
        // Projection stays at the logical viewport.
        assert_eq!(r.viewport(), Viewport::new(800.0, 600.0));

        r.deinit(&mut fx.dev);
    }
}
