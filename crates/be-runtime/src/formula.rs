use std::cell::RefCell;
use std::collections::HashMap;

use be_core::{BattleEventError, Character, CharacterKind, StatKind};
use rhai::{Dynamic, Engine, Map, Scope, AST, INT};

use crate::ports::FormulaEvaluator;

const MAX_FORMULA_OPERATIONS: u64 = 10_000;

/// Evaluates damage/heal formulas as rhai expressions.
///
/// `a` is the source's stat map (empty when there is no source), `b` the
/// target's, and `attr` the name of the gauge being changed.
pub struct RhaiFormulaEvaluator {
    engine: Engine,
    compiled: RefCell<HashMap<String, AST>>,
}

impl RhaiFormulaEvaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_FORMULA_OPERATIONS);
        Self {
            engine,
            compiled: RefCell::new(HashMap::new()),
        }
    }

    fn compile(&self, formula: &str) -> Result<AST, BattleEventError> {
        if let Some(ast) = self.compiled.borrow().get(formula) {
            return Ok(ast.clone());
        }
        let ast = self.engine.compile_expression(formula).map_err(|error| {
            BattleEventError::new(
                "FORMULA_COMPILE",
                format!("Formula \"{}\" failed to compile: {}", formula, error),
            )
        })?;
        self.compiled
            .borrow_mut()
            .insert(formula.to_string(), ast.clone());
        Ok(ast)
    }
}

impl Default for RhaiFormulaEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaEvaluator for RhaiFormulaEvaluator {
    fn evaluate(
        &self,
        formula: &str,
        source: Option<&Character>,
        target: &Character,
        attribute: StatKind,
    ) -> Result<f64, BattleEventError> {
        let ast = self.compile(formula)?;

        let mut scope = Scope::new();
        scope.push_constant(
            "a",
            Dynamic::from_map(source.map(stats_map).unwrap_or_default()),
        );
        scope.push_constant("b", Dynamic::from_map(stats_map(target)));
        scope.push_constant("attr", Dynamic::from(attribute_name(attribute).to_string()));

        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|error| {
                BattleEventError::new(
                    "FORMULA_EVAL",
                    format!("Formula \"{}\" failed: {}", formula, error),
                )
            })?;

        dynamic_to_number(value).ok_or_else(|| {
            BattleEventError::new(
                "FORMULA_RESULT",
                format!("Formula \"{}\" did not produce a number.", formula),
            )
        })
    }
}

fn attribute_name(attribute: StatKind) -> &'static str {
    match attribute {
        StatKind::Hp => "hp",
        StatKind::Mp => "mp",
    }
}

fn stats_map(character: &Character) -> Map {
    let level = match character.kind {
        CharacterKind::Player { level } => level,
        CharacterKind::Monster { .. } => 1,
    };
    let mut map = Map::new();
    for (name, value) in [
        ("hp", character.hp),
        ("mp", character.mp),
        ("max_hp", character.stats.max_hp),
        ("max_mp", character.stats.max_mp),
        ("attack", character.stats.attack),
        ("defense", character.stats.defense),
        ("magic", character.stats.magic),
        ("speed", character.stats.speed),
    ] {
        map.insert(name.into(), Dynamic::from(INT::from(value)));
    }
    map.insert("level".into(), Dynamic::from(INT::from(level)));
    map
}

fn dynamic_to_number(value: Dynamic) -> Option<f64> {
    if let Ok(int) = value.as_int() {
        return Some(int as f64);
    }
    value.as_float().ok().filter(|number| number.is_finite())
}
