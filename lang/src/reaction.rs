/// Locates the capability method that performs a reaction. The binder
/// never calls it; the host decides what a call means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef<T> {
    /// The type that declares the method, which may be a supertype of
    /// the receiver.
    pub owner: T,
    /// Index into the owner's capabilities.
    pub slot: usize,
    pub name: &'static str,
}

/// A discovered combinator between a left and a right operand type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reaction<T> {
    pub callable: MethodRef<T>,
    /// The method was found on the right operand with the left operand as
    /// its argument, either through a commutative swap or a postfix binder.
    pub swapped: bool,
    pub result_type: T,
}

impl<T> Reaction<T> {
    pub fn is_right_to_left(&self) -> bool {
        self.swapped
    }

    /// The operand the method is invoked on, given the pair it joins.
    pub fn receiver<'a, E>(&self, left: &'a E, right: &'a E) -> &'a E {
        if self.swapped {
            right
        } else {
            left
        }
    }
}
