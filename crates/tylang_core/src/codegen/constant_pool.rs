//! The class file constant pool: a deduplicated table of UTF-8 strings,
//! symbolic references and literals that every other class-file structure
//! indexes into by a 1-based `u16`.
//!
//! Every `add_*` method interns: asking for the same entry twice returns the
//! same index, keeping the pool (and the file) small and giving `==` on
//! `Type`/name pairs a cheap way to check "have we already referenced this".

use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    InterfaceMethodref(u16, u16),
    String(u16),
    Integer(i32),
    Float(u32),
    MethodHandle(u8, u16),
    MethodType(u16),
    InvokeDynamic(u16, u16),
}

/// Constant pool tags, per the class file format.
mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const INVOKE_DYNAMIC: u8 = 18;
}

/// `REF_invokeStatic`, the only method handle kind this emitter's
/// invokedynamic bootstraps need.
pub const REF_INVOKE_STATIC: u8 = 6;

#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Entry>,
    index: HashMap<Entry, u16>,
}

impl ConstantPool {
    fn intern(&mut self, entry: Entry) -> u16 {
        if let Some(idx) = self.index.get(&entry) {
            return *idx;
        }
        self.entries.push(entry.clone());
        let idx = self.entries.len() as u16;
        self.index.insert(entry, idx);
        idx
    }

    pub fn utf8(&mut self, value: impl Into<String>) -> u16 {
        self.intern(Entry::Utf8(value.into()))
    }

    pub fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.intern(Entry::Class(name))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_idx = self.utf8(name);
        let desc_idx = self.utf8(descriptor);
        self.intern(Entry::NameAndType(name_idx, desc_idx))
    }

    pub fn fieldref(&mut self, owner_internal_name: &str, name: &str, descriptor: &str) -> u16 {
        let class_idx = self.class(owner_internal_name);
        let nt_idx = self.name_and_type(name, descriptor);
        self.intern(Entry::Fieldref(class_idx, nt_idx))
    }

    pub fn methodref(&mut self, owner_internal_name: &str, name: &str, descriptor: &str) -> u16 {
        let class_idx = self.class(owner_internal_name);
        let nt_idx = self.name_and_type(name, descriptor);
        self.intern(Entry::Methodref(class_idx, nt_idx))
    }

    pub fn interface_methodref(
        &mut self,
        owner_internal_name: &str,
        name: &str,
        descriptor: &str,
    ) -> u16 {
        let class_idx = self.class(owner_internal_name);
        let nt_idx = self.name_and_type(name, descriptor);
        self.intern(Entry::InterfaceMethodref(class_idx, nt_idx))
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let utf8_idx = self.utf8(value);
        self.intern(Entry::String(utf8_idx))
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.intern(Entry::Integer(value))
    }

    pub fn float(&mut self, value: f64) -> u16 {
        self.intern(Entry::Float((value as f32).to_bits()))
    }

    pub fn method_handle(&mut self, kind: u8, methodref_index: u16) -> u16 {
        self.intern(Entry::MethodHandle(kind, methodref_index))
    }

    pub fn method_type(&mut self, descriptor: &str) -> u16 {
        let desc_idx = self.utf8(descriptor);
        self.intern(Entry::MethodType(desc_idx))
    }

    /// `bootstrap_method_attr_index` indexes the class's `BootstrapMethods`
    /// attribute, not the constant pool itself.
    pub fn invoke_dynamic(&mut self, bootstrap_method_attr_index: u16, name: &str, descriptor: &str) -> u16 {
        let nt_idx = self.name_and_type(name, descriptor);
        self.intern(Entry::InvokeDynamic(bootstrap_method_attr_index, nt_idx))
    }

    /// Number of entries, for the class file's `constant_pool_count` field
    /// (which is entry count + 1, per the format's 1-based, gap-for-wide-
    /// constants indexing).
    pub fn len(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        for entry in &self.entries {
            match entry {
                Entry::Utf8(s) => {
                    buf.push(tag::UTF8);
                    let bytes = s.as_bytes();
                    buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    buf.extend_from_slice(bytes);
                }
                Entry::Class(name_idx) => {
                    buf.push(tag::CLASS);
                    buf.extend_from_slice(&name_idx.to_be_bytes());
                }
                Entry::NameAndType(name_idx, desc_idx) => {
                    buf.push(tag::NAME_AND_TYPE);
                    buf.extend_from_slice(&name_idx.to_be_bytes());
                    buf.extend_from_slice(&desc_idx.to_be_bytes());
                }
                Entry::Fieldref(class_idx, nt_idx) => {
                    buf.push(tag::FIELDREF);
                    buf.extend_from_slice(&class_idx.to_be_bytes());
                    buf.extend_from_slice(&nt_idx.to_be_bytes());
                }
                Entry::Methodref(class_idx, nt_idx) => {
                    buf.push(tag::METHODREF);
                    buf.extend_from_slice(&class_idx.to_be_bytes());
                    buf.extend_from_slice(&nt_idx.to_be_bytes());
                }
                Entry::InterfaceMethodref(class_idx, nt_idx) => {
                    buf.push(tag::INTERFACE_METHODREF);
                    buf.extend_from_slice(&class_idx.to_be_bytes());
                    buf.extend_from_slice(&nt_idx.to_be_bytes());
                }
                Entry::String(utf8_idx) => {
                    buf.push(tag::STRING);
                    buf.extend_from_slice(&utf8_idx.to_be_bytes());
                }
                Entry::Integer(value) => {
                    buf.push(tag::INTEGER);
                    buf.extend_from_slice(&value.to_be_bytes());
                }
                Entry::Float(bits) => {
                    buf.push(tag::FLOAT);
                    buf.extend_from_slice(&bits.to_be_bytes());
                }
                Entry::MethodHandle(kind, methodref_idx) => {
                    buf.push(tag::METHOD_HANDLE);
                    buf.push(*kind);
                    buf.extend_from_slice(&methodref_idx.to_be_bytes());
                }
                Entry::MethodType(desc_idx) => {
                    buf.push(tag::METHOD_TYPE);
                    buf.extend_from_slice(&desc_idx.to_be_bytes());
                }
                Entry::InvokeDynamic(bootstrap_idx, nt_idx) => {
                    buf.push(tag::INVOKE_DYNAMIC);
                    buf.extend_from_slice(&bootstrap_idx.to_be_bytes());
                    buf.extend_from_slice(&nt_idx.to_be_bytes());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_duplicate_utf8() {
        let mut pool = ConstantPool::default();
        let a = pool.utf8("hello");
        let b = pool.utf8("hello");
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn distinct_methodrefs_get_distinct_indices() {
        let mut pool = ConstantPool::default();
        let a = pool.methodref("Foo", "bar", "()V");
        let b = pool.methodref("Foo", "baz", "()V");
        assert_ne!(a, b);
    }

    #[test]
    fn reinterning_methodref_reuses_index() {
        let mut pool = ConstantPool::default();
        let a = pool.methodref("Foo", "bar", "()V");
        let b = pool.methodref("Foo", "bar", "()V");
        assert_eq!(a, b);
    }
}
