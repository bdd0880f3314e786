//! Slot arena holding the bullets in flight.
//!
//! Bullets have no identity of their own, so the arena hands out
//! generation-tagged [`BulletHandle`]s. Removal is two-phase: systems mark
//! slots while they scan, and [`BulletArena::compact`] frees every marked slot
//! once the scan is over. A freed slot bumps its generation, so handles held
//! across a compaction stop resolving instead of aliasing a newer bullet.
//! Iteration follows insertion order, which is the order clients see.

use shared::Bullet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BulletHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    bullet: Option<Bullet>,
    marked: bool,
}

#[derive(Debug, Default)]
pub struct BulletArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<BulletHandle>,
}

impl BulletArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bullet: Bullet) -> BulletHandle {
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.bullet = Some(bullet);
                BulletHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    bullet: Some(bullet),
                    marked: false,
                });
                BulletHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.order.push(handle);
        handle
    }

    fn slot(&self, handle: BulletHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.bullet.is_some())
    }

    pub fn get(&self, handle: BulletHandle) -> Option<&Bullet> {
        self.slot(handle).and_then(|slot| slot.bullet.as_ref())
    }

    #[cfg(test)]
    pub fn is_marked(&self, handle: BulletHandle) -> bool {
        self.slot(handle).map_or(false, |slot| slot.marked)
    }

    /// Flags a bullet for removal at the next [`compact`](Self::compact).
    /// Returns false for stale handles.
    pub fn mark(&mut self, handle: BulletHandle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.bullet.is_some() => {
                slot.marked = true;
                true
            }
            _ => false,
        }
    }

    /// Marks every bullet matching `predicate`, returning how many were marked.
    pub fn mark_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Bullet) -> bool,
    {
        let mut marked = 0;
        for slot in &mut self.slots {
            if let Some(bullet) = &slot.bullet {
                if !slot.marked && predicate(bullet) {
                    slot.marked = true;
                    marked += 1;
                }
            }
        }
        marked
    }

    /// Frees all marked slots and returns how many bullets were removed.
    pub fn compact(&mut self) -> usize {
        let slots = &mut self.slots;
        let free = &mut self.free;
        let before = self.order.len();
        self.order.retain(|handle| {
            let slot = &mut slots[handle.index as usize];
            if !slot.marked {
                return true;
            }
            slot.bullet = None;
            slot.marked = false;
            slot.generation = slot.generation.wrapping_add(1);
            free.push(handle.index);
            false
        });
        before - self.order.len()
    }

    /// Live bullets in insertion order, including ones marked this tick.
    pub fn iter(&self) -> impl Iterator<Item = (BulletHandle, &Bullet)> + '_ {
        self.order.iter().filter_map(move |&handle| {
            self.slots[handle.index as usize]
                .bullet
                .as_ref()
                .map(|bullet| (handle, bullet))
        })
    }

    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Bullet),
    {
        for bullet in self.slots.iter_mut().filter_map(|slot| slot.bullet.as_mut()) {
            f(bullet);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
