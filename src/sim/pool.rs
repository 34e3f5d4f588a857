//! Pools and the registry that orders them
//!
//! Pools are only ever appended; the registry always holds at least one.

use crate::settings::StackLayout;

/// One fluid container
#[derive(Debug)]
pub struct Pool<F, C> {
    /// Height field, exclusively owned
    pub fluid: F,
    /// Caustic render target, exclusively owned
    pub caustics: C,
    water_level: f32,
    offset: f32,
}

impl<F, C> Pool<F, C> {
    pub fn new(fluid: F, caustics: C, water_level: f32, offset: f32) -> Self {
        Self {
            fluid,
            caustics,
            water_level,
            offset,
        }
    }

    pub fn water_level(&self) -> f32 {
        self.water_level
    }

    /// Set the level, clamped into `[min, max]`. NaN is ignored.
    pub fn set_water_level(&mut self, level: f32, min: f32, max: f32) {
        if level.is_nan() {
            return;
        }
        self.water_level = level.clamp(min, max);
    }

    /// Position along the stacking axis, fixed at creation
    pub fn offset(&self) -> f32 {
        self.offset
    }
}

/// Page scroll mirror: total extent grows with the pool count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub viewport_height: f32,
    pub extent: f32,
    pub position: f32,
}

impl ScrollState {
    fn new(viewport_height: f32, pool_count: usize) -> Self {
        Self {
            viewport_height,
            extent: pool_count as f32 * viewport_height,
            position: 0.0,
        }
    }

    /// Scroll position that shows pool `index`
    pub fn position_for(&self, index: usize) -> f32 {
        index as f32 * self.viewport_height
    }

    /// Scrolled fraction of the range that spans `pool_count` pools
    pub fn fraction(&self, pool_count: usize) -> f32 {
        let max_scroll = ((pool_count.saturating_sub(1)) as f32 * self.viewport_height).max(1.0);
        (self.position / max_scroll).clamp(0.0, 1.0)
    }
}

/// Ordered pools plus the index of the one being simulated
#[derive(Debug)]
pub struct ContainerRegistry<F, C> {
    pools: Vec<Pool<F, C>>,
    active: usize,
    scroll: ScrollState,
}

impl<F, C> ContainerRegistry<F, C> {
    pub fn new(first: Pool<F, C>, viewport_height: f32) -> Self {
        Self {
            pools: vec![first],
            active: 0,
            scroll: ScrollState::new(viewport_height, 1),
        }
    }

    /// Append a pool and grow the scrollable extent. Returns its index.
    pub fn append(&mut self, pool: Pool<F, C>) -> usize {
        self.pools.push(pool);
        self.scroll.extent = self.pools.len() as f32 * self.scroll.viewport_height;
        self.pools.len() - 1
    }

    /// Out-of-range indices are a bug: they assert in debug and clamp in release
    pub fn set_active(&mut self, index: usize) {
        debug_assert!(
            index < self.pools.len(),
            "active index {index} out of range for {} pools",
            self.pools.len()
        );
        self.active = index.min(self.pools.len() - 1);
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Pool<F, C> {
        &self.pools[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Pool<F, C> {
        &mut self.pools[self.active]
    }

    pub fn get(&self, index: usize) -> Option<&Pool<F, C>> {
        self.pools.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Pool<F, C>> {
        self.pools.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pool<F, C>> {
        self.pools.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pool<F, C>> {
        self.pools.iter_mut()
    }

    /// Offset for the next pool: one spacing unit past the last one
    pub fn next_offset(&self, spacing: f32, layout: StackLayout) -> f32 {
        let last = self.pools.last().map(Pool::offset).unwrap_or(0.0);
        last + layout.step(spacing)
    }

    /// (lowest, highest) pool offset
    pub fn offset_bounds(&self) -> (f32, f32) {
        self.pools.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
            (lo.min(p.offset), hi.max(p.offset))
        })
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn set_scroll_position(&mut self, position: f32) {
        self.scroll.position = position.clamp(0.0, self.scroll.extent.max(0.0));
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.scroll.viewport_height = height;
        self.scroll.extent = self.pools.len() as f32 * height;
    }

    /// Snap the scroll position onto pool `index`
    pub fn align_scroll(&mut self, index: usize) {
        self.scroll.position = self.scroll.position_for(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(offset: f32) -> Pool<(), ()> {
        Pool::new((), (), 0.0, offset)
    }

    #[test]
    fn test_append_grows_length_and_extent() {
        let mut registry = ContainerRegistry::new(pool(0.0), 800.0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.scroll().extent, 800.0);

        let offset = registry.next_offset(3.0, StackLayout::Vertical);
        assert_eq!(offset, -3.0);
        let index = registry.append(pool(offset));
        assert_eq!(index, 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.scroll().extent, 1600.0);
        assert_eq!(registry.offset_bounds(), (-3.0, 0.0));
        // Appending does not switch pools
        assert_eq!(registry.active_index(), 0);
    }

    #[test]
    fn test_set_active_in_range() {
        let mut registry = ContainerRegistry::new(pool(0.0), 600.0);
        registry.append(pool(3.0));
        registry.set_active(1);
        assert_eq!(registry.active_index(), 1);
        assert_eq!(registry.active().offset(), 3.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_set_active_out_of_range_asserts_in_debug() {
        let mut registry = ContainerRegistry::new(pool(0.0), 600.0);
        registry.set_active(4);
    }

    #[test]
    fn test_water_level_is_clamped() {
        let mut p = pool(0.0);
        p.set_water_level(5.0, -1.0, 0.15);
        assert_eq!(p.water_level(), 0.15);
        p.set_water_level(-9.0, -1.0, 0.15);
        assert_eq!(p.water_level(), -1.0);
    }

    #[test]
    fn test_scroll_alignment_and_fraction() {
        let mut registry = ContainerRegistry::new(pool(0.0), 500.0);
        registry.append(pool(-3.0));
        registry.append(pool(-6.0));
        registry.align_scroll(2);
        assert_eq!(registry.scroll().position, 1000.0);
        assert_eq!(registry.scroll().fraction(registry.len()), 1.0);
        registry.set_scroll_position(500.0);
        assert_eq!(registry.scroll().fraction(registry.len()), 0.5);
    }
}
