use std::rc::Rc;

/// A persistent counter keyed by symbol name, used as fuel for recursive
/// grammar expansion. `add` is non-destructive: it returns a new stack with
/// the given key's count incremented, leaving the original untouched, so
/// sibling branches of a query never see each other's counts.
///
/// Infinite recursion is correct behavior for a genuinely infinite grammar,
/// but enumeration has to stop somewhere; embedded symbols check
/// `exceeds_max` on every re-entry and go silent once their count reaches
/// the ceiling.
#[derive(Debug, Clone)]
pub struct CounterStack {
    max: usize,
    top: Option<Rc<Frame>>,
}

#[derive(Debug)]
struct Frame {
    key: String,
    count: usize,
    prev: Option<Rc<Frame>>,
}

impl CounterStack {
    pub fn new(max: usize) -> Self {
        CounterStack { max, top: None }
    }

    /// A new stack in which `key`'s count is one higher. Frames are shared
    /// with the original stack, never copied.
    pub fn add(&self, key: &str) -> CounterStack {
        CounterStack {
            max: self.max,
            top: Some(Rc::new(Frame {
                key: key.to_owned(),
                count: self.get(key) + 1,
                prev: self.top.clone(),
            })),
        }
    }

    /// Current count for `key`; zero if it was never added.
    pub fn get(&self, key: &str) -> usize {
        let mut frame = self.top.as_ref();
        while let Some(f) = frame {
            if f.key == key {
                return f.count;
            }
            frame = f.prev.as_ref();
        }
        0
    }

    pub fn exceeds_max(&self, key: &str) -> bool {
        self.get(key) >= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_keys_start_at_zero() {
        let stack = CounterStack::new(4);
        assert_eq!(stack.get("verb"), 0);
        assert!(!stack.exceeds_max("verb"));
    }

    #[test]
    fn test_add_is_non_destructive() {
        let stack = CounterStack::new(4);
        let deeper = stack.add("verb");
        assert_eq!(stack.get("verb"), 0);
        assert_eq!(deeper.get("verb"), 1);
    }

    #[test]
    fn test_counts_are_independent_per_key() {
        let stack = CounterStack::new(4).add("verb").add("noun").add("verb");
        assert_eq!(stack.get("verb"), 2);
        assert_eq!(stack.get("noun"), 1);
        assert_eq!(stack.get("adj"), 0);
    }

    #[test]
    fn test_exceeds_max() {
        let mut stack = CounterStack::new(2);
        stack = stack.add("s");
        assert!(!stack.exceeds_max("s"));
        stack = stack.add("s");
        assert!(stack.exceeds_max("s"));
    }
}
