use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::coords::SharedTransform;
use crate::device::{BufferUsage, DescriptorResource, DescriptorWrite, DeviceError, GpuDevice};
use crate::RenderError;

use super::{Sprite, TEXTURE_BINDING};

/// Binding slot of the model/projection block.
pub const UNIFORM_BINDING: u32 = 0;

/// Per-graphic uniform block, column-major.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteUniforms {
    pub model: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

pub const UNIFORM_SIZE: u64 = std::mem::size_of::<SpriteUniforms>() as u64;

struct FrameSlot<B: GpuDevice> {
    uniform_buffer: B::Buffer,
    descriptor_set: B::DescriptorSet,
}

/// On-screen instance of a [`Sprite`].
///
/// Owns one uniform buffer and one descriptor set per frame-in-flight slot,
/// allocated up front and never reallocated. Slot `i` is only written while
/// the device records frame slot `i`.
pub struct SpriteGraphic<B: GpuDevice> {
    sprite: Rc<Sprite<B>>,
    transform: SharedTransform,
    slots: Vec<FrameSlot<B>>,
    released: bool,
}

impl<B: GpuDevice> SpriteGraphic<B> {
    pub fn new(
        device: &mut B,
        sprite: Rc<Sprite<B>>,
        transform: SharedTransform,
    ) -> Result<Self, RenderError> {
        let frames = device.frames_in_flight();
        let mut slots = Vec::with_capacity(frames);

        for _ in 0..frames {
            match allocate_slot(device, &sprite) {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    release_slots(device, std::mem::take(&mut slots));
                    return Err(e.into());
                }
            }
        }

        Ok(Self {
            sprite,
            transform,
            slots,
            released: false,
        })
    }

    pub fn sprite(&self) -> &Rc<Sprite<B>> {
        &self.sprite
    }

    /// Swaps the displayed sprite without touching descriptor sets.
    ///
    /// The new sprite must share the current one's layout and texture (or both
    /// be untextured); anything else needs a new graphic.
    pub fn set_sprite(&mut self, sprite: Rc<Sprite<B>>) {
        debug_assert!(
            self.sprite.same_binding_shape(&sprite),
            "set_sprite: `{}` -> `{}` changes layout or texture",
            self.sprite.name(),
            sprite.name()
        );
        self.sprite = sprite;
    }

    pub fn transform(&self) -> &SharedTransform {
        &self.transform
    }

    pub fn frame_slots(&self) -> usize {
        self.slots.len()
    }

    /// Writes `{model, projection}` into the uniform buffer of `frame_slot`.
    pub fn update_uniforms(&self, device: &B, frame_slot: usize, projection: &Mat4) {
        debug_assert!(!self.released, "update_uniforms on a released graphic");
        let uniforms = SpriteUniforms {
            model: self.transform.get().matrix().to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        };
        device.write_buffer(
            &self.slots[frame_slot].uniform_buffer,
            0,
            bytemuck::bytes_of(&uniforms),
        );
    }

    pub fn descriptor_set(&self, frame_slot: usize) -> &B::DescriptorSet {
        &self.slots[frame_slot].descriptor_set
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Destroys every uniform buffer and frees every descriptor set.
    /// Calling it again is a no-op.
    pub fn release(&mut self, device: &mut B) {
        if self.released {
            return;
        }
        release_slots(device, std::mem::take(&mut self.slots));
        self.released = true;
    }
}

impl<B: GpuDevice> Drop for SpriteGraphic<B> {
    fn drop(&mut self) {
        if !self.released && !self.slots.is_empty() {
            log::warn!(
                "sprite graphic for `{}` dropped without release; {} frame slot(s) leaked",
                self.sprite.name(),
                self.slots.len()
            );
        }
    }
}

fn allocate_slot<B: GpuDevice>(
    device: &mut B,
    sprite: &Sprite<B>,
) -> Result<FrameSlot<B>, DeviceError> {
    let uniform_buffer = device.create_buffer(UNIFORM_SIZE, BufferUsage::Uniform)?;

    let mut writes = vec![DescriptorWrite {
        binding: UNIFORM_BINDING,
        resource: DescriptorResource::UniformBuffer {
            buffer: &uniform_buffer,
            offset: 0,
            range: UNIFORM_SIZE,
        },
    }];
    if let Some(t) = sprite.texture() {
        writes.push(DescriptorWrite {
            binding: TEXTURE_BINDING,
            resource: DescriptorResource::CombinedImageSampler {
                view: t.texture.view(),
                sampler: &t.sampler,
            },
        });
    }

    let set = device.allocate_descriptor_set(sprite.layout().descriptor_set_layout(), &writes);
    drop(writes);
    match set {
        Ok(descriptor_set) => Ok(FrameSlot {
            uniform_buffer,
            descriptor_set,
        }),
        Err(e) => {
            device.destroy_buffer(uniform_buffer);
            Err(e)
        }
    }
}

fn release_slots<B: GpuDevice>(device: &mut B, slots: Vec<FrameSlot<B>>) {
    let mut sets = Vec::with_capacity(slots.len());
    for slot in slots {
        device.destroy_buffer(slot.uniform_buffer);
        sets.push(slot.descriptor_set);
    }
    if !sets.is_empty() {
        device.free_descriptor_sets(sets);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::device::recording::RecordedWrite;
    use crate::device::DescriptorKind;
    use crate::sprite::test_support::{transform_at, Fixture};

    #[test]
    fn uniform_block_is_two_matrices() {
        assert_eq!(UNIFORM_SIZE, 128);
    }

    #[test]
    fn allocates_one_buffer_and_set_per_frame_slot() {
        let mut fx = Fixture::new();
        fx.dev.frames_in_flight = 3;
        let sprite = fx.flat("block");
        let before = fx.dev.live_buffers();

        let mut g = SpriteGraphic::new(&mut fx.dev, sprite, transform_at(0.0, 0.0))
            .unwrap();
        assert_eq!(g.frame_slots(), 3);
        assert_eq!(fx.dev.live_buffers(), before + 3);
        assert_eq!(fx.dev.descriptor_sets.len(), 3);
        g.release(&mut fx.dev);
    }

    #[test]
    fn untextured_sets_get_one_write() {
        let mut fx = Fixture::new();
        let sprite = fx.flat("block");
        let mut g = SpriteGraphic::new(&mut fx.dev, sprite, transform_at(0.0, 0.0))
            .unwrap();

        for slot in 0..g.frame_slots() {
            let writes = &fx.dev.descriptor_sets[g.descriptor_set(slot)];
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].binding, 0);
            assert_eq!(writes[0].kind, DescriptorKind::UniformBuffer);
            assert_eq!(writes[0].range, 128);
        }
        g.release(&mut fx.dev);
    }

    #[test]
    fn textured_sets_get_two_writes() {
        let mut fx = Fixture::new();
        let sprite = fx.textured("tile");
        let view = *sprite.texture().unwrap().texture.view();
        let sampler = sprite.texture().unwrap().sampler;
        let mut g = SpriteGraphic::new(&mut fx.dev, sprite, transform_at(0.0, 0.0))
            .unwrap();

        let writes = &fx.dev.descriptor_sets[g.descriptor_set(1)];
        assert_eq!(writes.len(), 2);
        assert_eq!(
            writes[1],
            RecordedWrite {
                binding: 1,
                kind: DescriptorKind::CombinedImageSampler,
                resource: view,
                range: 0,
                sampler: Some(sampler),
            }
        );
        g.release(&mut fx.dev);
    }

    #[test]
    fn update_writes_model_and_projection_into_the_slot_buffer() {
        let mut fx = Fixture::new();
        let sprite = fx.flat("block");
        let transform = transform_at(10.0, 20.0);
        let mut g = SpriteGraphic::new(&mut fx.dev, sprite, Rc::clone(&transform))
            .unwrap();

        let projection = Mat4::from_scale(glam::Vec3::splat(0.5));
        g.update_uniforms(&fx.dev, 1, &projection);

        let buffer = fx.dev.descriptor_sets[g.descriptor_set(1)][0].resource;
        let bytes = fx.dev.contents(buffer);
        let written: SpriteUniforms = bytemuck::pod_read_unaligned(&bytes);
        let expected = Mat4::from_translation(glam::Vec3::new(10.0, 20.0, 0.0));
        assert_eq!(written.model, expected.to_cols_array_2d());
        assert_eq!(written.projection, projection.to_cols_array_2d());

        // Slot 0 untouched.
        let other = fx.dev.descriptor_sets[g.descriptor_set(0)][0].resource;
        assert!(fx.dev.contents(other).iter().all(|b| *b == 0));

        // Transform changes are picked up on the next update.
        let mut t = transform.get();
        t.translate(Vec2::new(5.0, 0.0));
        transform.set(t);
        g.update_uniforms(&fx.dev, 1, &projection);
        let written: SpriteUniforms = bytemuck::pod_read_unaligned(&fx.dev.contents(buffer));
        assert_eq!(written.model[3][0], 15.0);

        g.release(&mut fx.dev);
    }

    #[test]
    fn release_is_idempotent() {
        let mut fx = Fixture::new();
        let sprite = fx.flat("block");
        let before = fx.dev.live_buffers();
        let mut g = SpriteGraphic::new(&mut fx.dev, sprite, transform_at(0.0, 0.0))
            .unwrap();

        g.release(&mut fx.dev);
        g.release(&mut fx.dev);
        assert!(g.is_released());
        assert_eq!(fx.dev.live_buffers(), before);
        assert!(fx.dev.descriptor_sets.is_empty());
        assert_eq!(fx.dev.freed_sets.len(), 2);
    }

    #[test]
    fn partial_failure_releases_what_was_allocated() {
        let mut fx = Fixture::new();
        let sprite = fx.flat("block");
        let before = fx.dev.live_buffers();
        fx.dev.fail.descriptor_set_after = Some(1);

        let err = SpriteGraphic::new(&mut fx.dev, sprite, transform_at(0.0, 0.0))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Device(DeviceError::DescriptorSetAllocation(_))));
        assert_eq!(fx.dev.live_buffers(), before);
        assert!(fx.dev.descriptor_sets.is_empty());
        assert_eq!(fx.dev.freed_sets.len(), 1);
    }

    #[test]
    fn buffer_failure_on_first_slot() {
        let mut fx = Fixture::new();
        let sprite = fx.flat("block");
        fx.dev.fail.buffer_after = Some(fx.dev.buffers_created);

        let err = SpriteGraphic::new(&mut fx.dev, sprite, transform_at(0.0, 0.0))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Device(DeviceError::BufferAllocation { .. })));
        assert!(fx.dev.descriptor_sets.is_empty());
    }

    #[test]
    fn set_sprite_keeps_descriptor_sets() {
        let mut fx = Fixture::new();
        let a = fx.flat("a");
        let b = fx.flat("b");
        let mut g = SpriteGraphic::new(&mut fx.dev, a, transform_at(0.0, 0.0))
            .unwrap();
        let set = *g.descriptor_set(0);
        let allocated = fx.dev.sets_allocated;

        g.set_sprite(Rc::clone(&b));
        assert!(Rc::ptr_eq(g.sprite(), &b));
        assert_eq!(*g.descriptor_set(0), set);
        assert_eq!(fx.dev.sets_allocated, allocated);
        g.release(&mut fx.dev);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "changes layout or texture")]
    fn set_sprite_rejects_shape_change() {
        let mut fx = Fixture::new();
        let flat = fx.flat("flat");
        let textured = fx.textured("tile");
        let mut g = SpriteGraphic::new(&mut fx.dev, flat, transform_at(0.0, 0.0))
            .unwrap();
        g.release(&mut fx.dev);
        g.set_sprite(textured);
    }
}
