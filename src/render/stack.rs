use std::collections::BTreeMap;

use crate::render::context::Mixin;
use crate::Value;

/// The scope stack of a single render.
///
/// The stack always holds at least one frame, the scope of the template
/// being rendered.
#[derive(Debug)]
pub(crate) struct Stack<'r> {
    frames: Vec<Frame<'r>>,
}

#[derive(Debug, Default)]
struct Frame<'r> {
    vars: BTreeMap<String, Value>,
    mixins: BTreeMap<&'r str, Mixin<'r>>,
}

impl<'r> Stack<'r> {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Removes every variable bound in the innermost frame.
    pub fn reset(&mut self) {
        self.top().vars.clear();
    }

    /// Looks up a variable, innermost frame first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.vars.get(name))
    }

    /// Binds a variable in the innermost frame.
    pub fn define(&mut self, name: &str, value: Value) {
        self.top().vars.insert(name.to_owned(), value);
    }

    /// Rebinds the innermost existing variable with this name, or defines it
    /// in the innermost frame.
    pub fn assign(&mut self, name: &str, value: Value) {
        let existing = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.vars.get_mut(name));
        match existing {
            Some(slot) => *slot = value,
            None => self.define(name, value),
        }
    }

    pub fn set_mixin(&mut self, name: &'r str, mixin: Mixin<'r>) {
        self.top().mixins.insert(name, mixin);
    }

    pub fn get_mixin(&self, name: &str) -> Option<&Mixin<'r>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.mixins.get(name))
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn top(&mut self) -> &mut Frame<'r> {
        // The base frame is never popped.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_shadowing() {
        let mut stack = Stack::new();
        stack.define("x", Value::from(1));
        stack.push();
        stack.define("x", Value::from(2));
        assert_eq!(stack.get("x"), Some(&Value::from(2)));
        stack.pop();
        assert_eq!(stack.get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn stack_assign_updates_outer_binding() {
        let mut stack = Stack::new();
        stack.define("n", Value::from(0));
        stack.push();
        stack.assign("n", Value::from(1));
        stack.assign("m", Value::from(2));
        stack.pop();
        assert_eq!(stack.get("n"), Some(&Value::from(1)));
        assert_eq!(stack.get("m"), None);
    }

    #[test]
    fn stack_reset_and_base_frame() {
        let mut stack = Stack::new();
        stack.push();
        stack.define("a", Value::from(true));
        stack.reset();
        assert_eq!(stack.get("a"), None);
        stack.pop();
        stack.pop();
        assert_eq!(stack.depth(), 1);
    }
}
