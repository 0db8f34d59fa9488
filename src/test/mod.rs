//! Shared fixtures for unit tests.

use std::{borrow::Cow, collections::HashMap};

use crate::{
    classfile::{constant::RefKind, flags::MemberAccessFlags, ClassUnit},
    remapper::NameMapper,
};

/// A [`NameMapper`] backed by plain maps, in scope for `net/minecraft` only.
#[derive(Debug, Default)]
pub struct TableMapper {
    classes: HashMap<String, String>,
    methods: HashMap<String, String>,
    fields: HashMap<String, String>,
}

impl TableMapper {
    pub fn classes<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        TableMapper {
            classes: to_map(pairs),
            ..Self::default()
        }
    }

    pub fn with_methods<'a>(mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.methods = to_map(pairs);
        self
    }

    pub fn with_fields<'a>(mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.fields = to_map(pairs);
        self
    }

    fn lookup<'a>(map: &'a HashMap<String, String>, owner: &str, name: &'a str) -> Cow<'a, str> {
        if !owner.starts_with("net/minecraft") {
            return Cow::Borrowed(name);
        }
        Cow::Borrowed(map.get(name).map_or(name, String::as_str))
    }
}

fn to_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

impl NameMapper for TableMapper {
    fn map_class<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        Self::lookup(&self.classes, name, name)
    }

    fn map_method_name<'a>(&'a self, owner: &str, name: &'a str, _descriptor: &str) -> Cow<'a, str> {
        Self::lookup(&self.methods, owner, name)
    }

    fn map_field_name<'a>(&'a self, owner: &str, name: &'a str, _descriptor: &str) -> Cow<'a, str> {
        Self::lookup(&self.fields, owner, name)
    }
}

/// `net/minecraft/class_1 extends net/minecraft/class_2`, declaring `field_1` and `method_1`
/// and referencing `java/lang/Object.hashCode`.
pub fn sample_unit() -> ClassUnit {
    let mut unit = ClassUnit::new("net/minecraft/class_1", Some("net/minecraft/class_2"))
        .expect("fresh pool has room");
    unit.add_field(MemberAccessFlags::PRIVATE, "field_1", "Lnet/minecraft/class_2;")
        .expect("fresh pool has room");
    unit.add_method(MemberAccessFlags::PUBLIC, "method_1", "(Lnet/minecraft/class_1;)V")
        .expect("fresh pool has room");
    unit.pool
        .intern_member_ref(RefKind::Method, "java/lang/Object", "hashCode", "()I")
        .expect("fresh pool has room");
    unit
}
