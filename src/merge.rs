use crate::{descriptor::ComponentDescriptor, module::Module};

pub trait Merge<T> {
    type Output;

    #[must_use]
    fn merge(self, other: T) -> Self::Output;
}

impl Merge<Module> for Module {
    type Output = Module;

    #[inline]
    fn merge(mut self, other: Module) -> Self::Output {
        self.extend(other.into_descriptors());
        self
    }
}

impl Merge<ComponentDescriptor> for Module {
    type Output = Module;

    #[inline]
    fn merge(mut self, descriptor: ComponentDescriptor) -> Self::Output {
        self.add(descriptor);
        self
    }
}

impl<const N: usize> Merge<[Module; N]> for Module {
    type Output = Module;

    #[inline]
    fn merge(self, others: [Module; N]) -> Self::Output {
        others.into_iter().fold(self, Merge::merge)
    }
}
