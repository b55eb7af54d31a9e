use crate::Builder;
use crate::targets::{go, rust, typescript};

/// Builders addressable by name.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: Vec<Box<dyn Builder>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every builder this crate ships.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(typescript::FetchClient);
        registry.register(typescript::ExpressServer);
        registry.register(go::HttpClient);
        registry.register(go::ChiServer);
        registry.register(rust::ReqwestClient);
        registry.register(rust::AxumServer);
        registry
    }

    /// Replaces any builder with the same name.
    pub fn register(&mut self, builder: impl Builder + 'static) {
        self.builders.retain(|b| b.name() != builder.name());
        self.builders.push(Box::new(builder));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Builder> {
        self.iter().find(|b| b.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Builder> {
        self.builders.iter().map(|b| b.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|b| b.name()).collect()
    }
}
