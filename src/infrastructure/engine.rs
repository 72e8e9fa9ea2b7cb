// Infrastructure: process-wide solve engine
// Built once on first use; stateless afterwards, so concurrent calls are safe

use crate::application::{SolveFacade, Solution};
use crate::domain::{
    models::Model,
    options::{OptionMap, OptionRegistry},
    solver_service::{OptionError, Result},
};
use lazy_static::lazy_static;

lazy_static! {
    static ref ENGINE: Engine = Engine::new();
}

pub struct Engine {
    facade: SolveFacade,
}

impl Engine {
    fn new() -> Self {
        Self {
            facade: SolveFacade::new(OptionRegistry::standard()),
        }
    }

    /// The shared engine, initialised on first call
    pub fn global() -> &'static Engine {
        &ENGINE
    }

    pub fn registry(&self) -> &OptionRegistry {
        self.facade.registry()
    }

    pub fn solve(&self, text: &str, options: &OptionMap) -> Result<Solution> {
        self.facade.solve(text, options)
    }

    pub fn solve_model(&self, model: &Model, options: &OptionMap) -> Result<Solution> {
        self.facade.solve_model(model, options)
    }

    /// Solve with options given as a JSON object of name → value
    pub fn solve_with_json_options(
        &self,
        text: &str,
        options: &serde_json::Value,
    ) -> Result<Solution> {
        let options = parse_json_options(options)?;
        self.solve(text, &options)
    }
}

fn parse_json_options(options: &serde_json::Value) -> std::result::Result<OptionMap, OptionError> {
    if options.is_null() {
        return Ok(OptionMap::new());
    }
    serde_json::from_value(options.clone()).map_err(|error| OptionError::WrongType {
        name: "options".to_string(),
        expected: "an object of booleans, numbers and strings".to_string(),
        found: error.to_string(),
    })
}
