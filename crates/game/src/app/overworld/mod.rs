mod movement;
mod scene;

pub(crate) use scene::OverworldScene;
