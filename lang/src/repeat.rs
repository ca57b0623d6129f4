use crate::prelude::*;
use std::fmt;

/// Formats `item` a number of times in a row without building a string.
#[derive(Clone, Copy)]
pub struct Repeated<T> {
    times: usize,
    item: T,
}

impl<T: fmt::Display> fmt::Display for Repeated<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        profile_method!(fmt);

        for _ in 0..self.times {
            self.item.fmt(f)?;
        }
        Ok(())
    }
}

pub fn repeat<T>(times: usize, item: T) -> Repeated<T> {
    Repeated { times, item }
}

/// A caret under the character at `column`.
pub fn caret(column: usize) -> impl fmt::Display {
    struct Caret(usize);

    impl fmt::Display for Caret {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}^", repeat(self.0, ' '))
        }
    }

    Caret(column)
}
