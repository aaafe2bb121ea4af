//! Assembles a complete class file byte layout from a [`ConstantPool`] and
//! the field/method/bootstrap tables the declaration emitters build up.
//! Every `*_info` struct here mirrors the class file format's own structure
//! directly rather than an intermediate representation, since there is no
//! further lowering after this — `write_to` is the last step before bytes
//! hit disk.

use super::constant_pool::ConstantPool;

pub const MAGIC: u32 = 0xCAFEBABE;
/// Java 11 (class file major version 55) is the oldest version with
/// constant-pool-indexed dynamic constants fully specified alongside
/// `invokedynamic`, which this emitter's lambda materialisation relies on.
pub const MAJOR_VERSION: u16 = 55;
pub const MINOR_VERSION: u16 = 0;

pub mod access {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
}

impl FieldInfo {
    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.access_flags.to_be_bytes());
        buf.extend_from_slice(&self.name_index.to_be_bytes());
        buf.extend_from_slice(&self.descriptor_index.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

/// A method's `Code` attribute. `None` for abstract trait methods.
#[derive(Debug, Clone)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub code: Option<CodeAttribute>,
}

impl MethodInfo {
    fn write_to(&self, buf: &mut Vec<u8>, code_attr_name_index: u16) {
        buf.extend_from_slice(&self.access_flags.to_be_bytes());
        buf.extend_from_slice(&self.name_index.to_be_bytes());
        buf.extend_from_slice(&self.descriptor_index.to_be_bytes());

        match &self.code {
            Some(code) => {
                buf.extend_from_slice(&1u16.to_be_bytes()); // attributes_count

                let mut body = Vec::new();
                body.extend_from_slice(&code.max_stack.to_be_bytes());
                body.extend_from_slice(&code.max_locals.to_be_bytes());
                body.extend_from_slice(&(code.code.len() as u32).to_be_bytes());
                body.extend_from_slice(&code.code);
                body.extend_from_slice(&(code.exception_table.len() as u16).to_be_bytes());
                for entry in &code.exception_table {
                    body.extend_from_slice(&entry.start_pc.to_be_bytes());
                    body.extend_from_slice(&entry.end_pc.to_be_bytes());
                    body.extend_from_slice(&entry.handler_pc.to_be_bytes());
                    body.extend_from_slice(&entry.catch_type.to_be_bytes());
                }
                body.extend_from_slice(&0u16.to_be_bytes()); // attributes_count (of Code itself)

                buf.extend_from_slice(&code_attr_name_index.to_be_bytes());
                buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
                buf.extend_from_slice(&body);
            }
            None => {
                buf.extend_from_slice(&0u16.to_be_bytes());
            }
        }
    }
}

/// One entry of the `BootstrapMethods` attribute: the invokedynamic lambda
/// factory handle plus the static arguments passed to it (the target
/// functional interface's method type, the implementation method handle,
/// and its enforced method type).
#[derive(Debug, Clone)]
pub struct BootstrapMethod {
    pub method_ref_index: u16,
    pub arguments: Vec<u16>,
}

#[derive(Debug)]
pub struct ClassFile {
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub bootstrap_methods: Vec<BootstrapMethod>,
}

impl ClassFile {
    /// Serialises the complete class file, consuming the constant pool
    /// (the two attribute-name UTF-8 entries needed for `Code` and
    /// `BootstrapMethods` are interned here, last, so every other index
    /// referenced by field/method bodies is stable beforehand).
    pub fn into_bytes(mut self) -> Vec<u8> {
        let code_attr_name = self.constant_pool.utf8("Code");

        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC.to_be_bytes());
        buf.extend_from_slice(&MINOR_VERSION.to_be_bytes());
        buf.extend_from_slice(&MAJOR_VERSION.to_be_bytes());

        let bootstrap_attr_name = if self.bootstrap_methods.is_empty() {
            None
        } else {
            Some(self.constant_pool.utf8("BootstrapMethods"))
        };

        buf.extend_from_slice(&(self.constant_pool.len() + 1).to_be_bytes());
        self.constant_pool.write_to(&mut buf);

        buf.extend_from_slice(&self.access_flags.to_be_bytes());
        buf.extend_from_slice(&self.this_class.to_be_bytes());
        buf.extend_from_slice(&self.super_class.to_be_bytes());

        buf.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for iface in &self.interfaces {
            buf.extend_from_slice(&iface.to_be_bytes());
        }

        buf.extend_from_slice(&(self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            field.write_to(&mut buf);
        }

        buf.extend_from_slice(&(self.methods.len() as u16).to_be_bytes());
        for method in &self.methods {
            method.write_to(&mut buf, code_attr_name);
        }

        match bootstrap_attr_name {
            Some(name_index) => {
                buf.extend_from_slice(&1u16.to_be_bytes()); // attributes_count

                let mut body = Vec::new();
                body.extend_from_slice(&(self.bootstrap_methods.len() as u16).to_be_bytes());
                for bsm in &self.bootstrap_methods {
                    body.extend_from_slice(&bsm.method_ref_index.to_be_bytes());
                    body.extend_from_slice(&(bsm.arguments.len() as u16).to_be_bytes());
                    for arg in &bsm.arguments {
                        body.extend_from_slice(&arg.to_be_bytes());
                    }
                }

                buf.extend_from_slice(&name_index.to_be_bytes());
                buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
                buf.extend_from_slice(&body);
            }
            None => {
                buf.extend_from_slice(&0u16.to_be_bytes());
            }
        }

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_class_starts_with_magic_and_version() {
        let mut pool = ConstantPool::default();
        let this_class = pool.class("Empty");
        let super_class = pool.class("java/lang/Object");
        let class = ClassFile {
            constant_pool: pool,
            access_flags: access::PUBLIC | access::SUPER,
            this_class,
            super_class,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            bootstrap_methods: vec![],
        };
        let bytes = class.into_bytes();
        assert_eq!(&bytes[0..4], &MAGIC.to_be_bytes());
        assert_eq!(&bytes[4..6], &MINOR_VERSION.to_be_bytes());
        assert_eq!(&bytes[6..8], &MAJOR_VERSION.to_be_bytes());
    }
}
