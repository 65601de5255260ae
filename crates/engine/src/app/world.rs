use std::ops::Add;

use crate::content::Gate;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

/// Axis-aligned rectangle in screen-style coordinates: `top < bottom` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            width: size.x,
            height: size.y,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    frame_count: u32,
    ticks_per_frame: u32,
    frame: u32,
    tick: u32,
}

impl AnimationState {
    pub fn new(frame_count: u32, ticks_per_frame: u32) -> Self {
        Self {
            frame_count: frame_count.max(1),
            ticks_per_frame: ticks_per_frame.max(1),
            frame: 0,
            tick: 0,
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    fn advance(&mut self) {
        self.tick += 1;
        if self.tick >= self.ticks_per_frame {
            self.tick = 0;
            self.frame = (self.frame + 1) % self.frame_count;
        }
    }
}

/// How an entity's image behaves over time. Chosen once when the entity is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteVariant {
    Animated(AnimationState),
    Static,
}

impl SpriteVariant {
    pub fn animated(frame_count: u32, ticks_per_frame: u32) -> Self {
        Self::Animated(AnimationState::new(frame_count, ticks_per_frame))
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Animated(_))
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub image: String,
    position: Vec2,
    previous_position: Vec2,
    size: Vec2,
    variant: SpriteVariant,
}

impl Entity {
    pub fn new(
        id: EntityId,
        image: impl Into<String>,
        position: Vec2,
        size: Vec2,
        variant: SpriteVariant,
    ) -> Self {
        Self {
            id,
            image: image.into(),
            position,
            previous_position: position,
            size,
            variant,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn previous_position(&self) -> Vec2 {
        self.previous_position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn variant(&self) -> &SpriteVariant {
        &self.variant
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn has_moved(&self) -> bool {
        self.position != self.previous_position
    }

    /// Records the current position as last frame's and applies `delta`.
    /// Call once per tick, with `Vec2::ZERO` when standing still.
    pub fn step(&mut self, delta: Vec2) {
        self.previous_position = self.position;
        self.position = self.position + delta;
    }

    pub fn update_frame(&mut self) {
        match &mut self.variant {
            SpriteVariant::Animated(animation) => animation.advance(),
            SpriteVariant::Static => {}
        }
    }

    pub fn current_frame(&self) -> Option<(u32, u32)> {
        match &self.variant {
            SpriteVariant::Animated(animation) => {
                Some((animation.frame(), animation.frame_count()))
            }
            SpriteVariant::Static => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Background,
    Npc,
    Obstacle,
    Gate,
    Player,
}

impl ContainerKind {
    /// Draw order, back to front.
    pub const ALL: [ContainerKind; 5] = [
        ContainerKind::Background,
        ContainerKind::Obstacle,
        ContainerKind::Npc,
        ContainerKind::Gate,
        ContainerKind::Player,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContainerKind::Background => "background",
            ContainerKind::Npc => "npc",
            ContainerKind::Obstacle => "obstacle",
            ContainerKind::Gate => "gate",
            ContainerKind::Player => "player",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityContainer {
    kind: ContainerKind,
    entities: Vec<Entity>,
}

impl EntityContainer {
    pub fn new(kind: ContainerKind) -> Self {
        Self {
            kind,
            entities: Vec::new(),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn add(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|entity| entity.id == id)?;
        Some(self.entities.remove(index))
    }

    /// Drops every entity and returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entities.len();
        self.entities.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn first(&self) -> Option<&Entity> {
        self.entities.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut Entity> {
        self.entities.first_mut()
    }

    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }
}

/// Everything the frame loop sees of the current map. Replaced whole on transition.
#[derive(Debug, Clone)]
pub struct ActiveMapState {
    map_name: String,
    active_gate: Gate,
    background: EntityContainer,
    npcs: EntityContainer,
    obstacles: EntityContainer,
    gates: EntityContainer,
    player: EntityContainer,
}

impl ActiveMapState {
    pub(crate) fn empty(map_name: impl Into<String>, active_gate: Gate) -> Self {
        Self {
            map_name: map_name.into(),
            active_gate,
            background: EntityContainer::new(ContainerKind::Background),
            npcs: EntityContainer::new(ContainerKind::Npc),
            obstacles: EntityContainer::new(ContainerKind::Obstacle),
            gates: EntityContainer::new(ContainerKind::Gate),
            player: EntityContainer::new(ContainerKind::Player),
        }
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn active_gate(&self) -> &Gate {
        &self.active_gate
    }

    pub fn container(&self, kind: ContainerKind) -> &EntityContainer {
        match kind {
            ContainerKind::Background => &self.background,
            ContainerKind::Npc => &self.npcs,
            ContainerKind::Obstacle => &self.obstacles,
            ContainerKind::Gate => &self.gates,
            ContainerKind::Player => &self.player,
        }
    }

    pub fn container_mut(&mut self, kind: ContainerKind) -> &mut EntityContainer {
        match kind {
            ContainerKind::Background => &mut self.background,
            ContainerKind::Npc => &mut self.npcs,
            ContainerKind::Obstacle => &mut self.obstacles,
            ContainerKind::Gate => &mut self.gates,
            ContainerKind::Player => &mut self.player,
        }
    }

    pub fn backdrop(&self) -> Option<&Entity> {
        self.background.first()
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player.first()
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.player.first_mut()
    }

    pub fn gate_entity(&self) -> Option<&Entity> {
        self.gates.first()
    }

    pub fn entity_count(&self) -> usize {
        ContainerKind::ALL
            .iter()
            .map(|kind| self.container(*kind).len())
            .sum()
    }

    pub fn is_cleared(&self) -> bool {
        self.entity_count() == 0
    }

    /// Empties every container. Returns the number of entities destroyed.
    pub fn clear_all(&mut self) -> usize {
        ContainerKind::ALL
            .iter()
            .map(|kind| self.container_mut(*kind).clear())
            .sum()
    }

    pub fn update_frames(&mut self) {
        for kind in ContainerKind::ALL {
            for entity in self.container_mut(kind).entities_mut() {
                entity.update_frame();
            }
        }
    }
}
