use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Bounded stacks
///
/// The executor keeps its operands and its call frames on two of these.
/// Pushing past the limit fails with `OutOfMemory` naming which stack
/// overflowed, so runaway recursion ends the thread instead of the process.

pub struct Stack<T> {
    what: &'static str,
    limit: usize,
    items: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter().rev()).finish()
    }
}

impl<T> Stack<T> {
    pub fn new(what: &'static str, limit: usize) -> Stack<T> {
        Stack {
            what,
            limit,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear()
    }

    /// Drop everything above `base`. A frame returning uses this to
    /// discard operands its callee left behind.
    pub fn truncate(&mut self, base: usize) {
        self.items.truncate(base)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.items.last_mut()
    }

    pub fn get(&self, depth: usize) -> Option<&T> {
        self.items.get(depth)
    }

    pub fn push(&mut self, item: T) -> Result<()> {
        if self.items.len() >= self.limit {
            return Err(error!(OutOfMemory; self.what));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T> {
        self.items.pop().ok_or_else(|| error!(StackUnderflow))
    }

    /// Operands of a binary operation, left hand side first.
    pub fn pop_2(&mut self) -> Result<(T, T)> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        Ok((lhs, rhs))
    }

    /// The top `count` items in push order.
    pub fn pop_n(&mut self, count: usize) -> Result<Vec<T>> {
        match self.items.len().checked_sub(count) {
            Some(at) => Ok(self.items.split_off(at)),
            None => Err(error!(StackUnderflow)),
        }
    }
}

impl<T: Clone> Stack<T> {
    pub fn top(&self) -> Result<T> {
        self.items.last().cloned().ok_or_else(|| error!(StackUnderflow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_limit() {
        let mut s: Stack<i64> = Stack::new("OPERANDS", 2);
        s.push(1).unwrap();
        s.push(2).unwrap();
        let e = s.push(3).unwrap_err();
        assert_eq!(e.code(), ErrorCode::OutOfMemory);
        assert_eq!(e.text(), "OPERANDS");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_pop_order() {
        let mut s: Stack<i64> = Stack::new("OPERANDS", 8);
        for n in 1..=4 {
            s.push(n).unwrap();
        }
        assert_eq!(s.pop_2().unwrap(), (3, 4));
        assert_eq!(s.pop_n(2).unwrap(), vec![1, 2]);
        assert_eq!(s.pop().unwrap_err().code(), ErrorCode::StackUnderflow);
        assert_eq!(s.pop_n(1).unwrap_err().code(), ErrorCode::StackUnderflow);
        assert!(s.pop_n(0).unwrap().is_empty());
    }
}
