//! Generational storage for graphics and the ordered render list.

/// Stable handle to a graphic owned by a [`SpriteRenderer`](super::SpriteRenderer).
///
/// A handle outlives its graphic safely: once the slot is reused the
/// generation no longer matches and lookups return `None`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GraphicId {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational arena.
pub struct GraphicArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for GraphicArena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> GraphicArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> GraphicId {
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                GraphicId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                GraphicId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub fn remove(&mut self, id: GraphicId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: GraphicId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, id: GraphicId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, id: GraphicId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every value, invalidating all handles.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(v) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                out.push(v);
            }
        }
        self.len = 0;
        out
    }
}

/// Insertion-ordered list of graphics to draw.
#[derive(Debug, Default, Clone)]
pub struct RenderList {
    order: Vec<GraphicId>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id`. Registering the same graphic twice fails a debug assertion.
    pub fn push(&mut self, id: GraphicId) {
        debug_assert!(!self.contains(id), "{id:?} is already in the render list");
        self.order.push(id);
    }

    /// Removes `id`, keeping the order of the others.
    pub fn remove(&mut self, id: GraphicId) -> bool {
        match self.order.iter().position(|x| *x == id) {
            Some(i) => {
                self.order.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: GraphicId) -> bool {
        self.order.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = GraphicId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
