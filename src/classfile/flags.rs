//! Access flags of classes and their members.
//!
//! Unknown bits are retained on decode so an unmodified unit re-encodes to the same bytes.

use bitflags::bitflags;

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
    /// `access_flags` of a `ClassFile`
    pub struct ClassAccessFlags: u16 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by `invokespecial`
        const SUPER = 0x0020;
        /// Is an interface
        const INTERFACE = 0x0200;
        /// Declared `abstract`
        const ABSTRACT = 0x0400;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
        /// Is a module, not a class or interface
        const MODULE = 0x8000;
    }
}

bitflags! {
    #[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
    /// `access_flags` of a `field_info` or `method_info`
    pub struct MemberAccessFlags: u16 {
        /// Declared `public`
        const PUBLIC = 0x0001;
        /// Declared `private`
        const PRIVATE = 0x0002;
        /// Declared `protected`
        const PROTECTED = 0x0004;
        /// Declared `static`
        const STATIC = 0x0008;
        /// Declared `final`
        const FINAL = 0x0010;
        /// Method declared `synchronized`
        const SYNCHRONIZED = 0x0020;
        /// Field declared `volatile`
        const VOLATILE = 0x0040;
        /// Compiler-generated bridge method
        const BRIDGE = 0x0040;
        /// Field declared `transient`
        const TRANSIENT = 0x0080;
        /// Method with variable arity
        const VARARGS = 0x0080;
        /// Method declared `native`
        const NATIVE = 0x0100;
        /// Method declared `abstract`
        const ABSTRACT = 0x0400;
        /// Method declared `strictfp`
        const STRICT = 0x0800;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Field is an enum constant
        const ENUM = 0x4000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_retained() {
        let flags = ClassAccessFlags::from_bits_retain(0x0021 | 0x0100);
        assert!(flags.contains(ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER));
        assert_eq!(flags.bits(), 0x0121);

        let member = MemberAccessFlags::from_bits_retain(0x0009);
        assert!(member.contains(MemberAccessFlags::STATIC));
        assert!(!member.contains(MemberAccessFlags::PRIVATE));
    }
}
