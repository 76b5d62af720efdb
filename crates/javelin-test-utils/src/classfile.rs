use std::collections::HashMap;

const MAJOR_JAVA_8: u16 = 52;

/// Writes minimal class binaries: constant pool, members and the declaration attributes
/// the reader understands. Method bodies are never emitted.
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    this_class: String,
    super_class: Option<String>,
    access_flags: u16,
    interfaces: Vec<String>,
    signature: Option<String>,
    annotations: Vec<String>,
    fields: Vec<MemberBuilder>,
    methods: Vec<MemberBuilder>,
    inner_classes: Vec<(String, Option<String>, Option<String>, u16)>,
}

#[derive(Debug, Clone)]
pub struct MemberBuilder {
    access_flags: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    exceptions: Vec<String>,
    annotations: Vec<String>,
}

impl MemberBuilder {
    pub fn new(access_flags: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            exceptions: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn throws(mut self, internal_name: &str) -> Self {
        self.exceptions.push(internal_name.to_string());
        self
    }

    /// Adds a marker annotation given its descriptor, e.g. `Ljavax/annotation/Nullable;`.
    pub fn annotation(mut self, descriptor: &str) -> Self {
        self.annotations.push(descriptor.to_string());
        self
    }
}

impl ClassFileBuilder {
    /// Public class extending `java/lang/Object`.
    pub fn new(internal_name: &str) -> Self {
        Self {
            this_class: internal_name.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            access_flags: 0x0021,
            interfaces: Vec::new(),
            signature: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
        }
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn super_class(mut self, internal_name: Option<&str>) -> Self {
        self.super_class = internal_name.map(str::to_string);
        self
    }

    pub fn interface(mut self, internal_name: &str) -> Self {
        self.interfaces.push(internal_name.to_string());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotation(mut self, descriptor: &str) -> Self {
        self.annotations.push(descriptor.to_string());
        self
    }

    pub fn field(mut self, field: MemberBuilder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MemberBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds an `InnerClasses` entry. `inner_name` is `None` for anonymous classes.
    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        inner_name: Option<&str>,
        flags: u16,
    ) -> Self {
        self.inner_classes.push((
            inner.to_string(),
            outer.map(str::to_string),
            inner_name.map(str::to_string),
            flags,
        ));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut cp = Pool::default();
        let mut body = Vec::new();

        push_u16(&mut body, self.access_flags);
        push_u16(&mut body, cp.class(&self.this_class));
        let super_index = self.super_class.as_deref().map_or(0, |s| cp.class(s));
        push_u16(&mut body, super_index);
        push_u16(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            push_u16(&mut body, cp.class(interface));
        }
        for members in [&self.fields, &self.methods] {
            push_u16(&mut body, members.len() as u16);
            for member in members {
                push_u16(&mut body, member.access_flags);
                push_u16(&mut body, cp.utf8(&member.name));
                push_u16(&mut body, cp.utf8(&member.descriptor));
                let mut attrs = Vec::new();
                signature_attr(&mut cp, &mut attrs, member.signature.as_deref());
                if !member.exceptions.is_empty() {
                    let mut info = Vec::new();
                    push_u16(&mut info, member.exceptions.len() as u16);
                    for exception in &member.exceptions {
                        push_u16(&mut info, cp.class(exception));
                    }
                    attrs.push((cp.utf8("Exceptions"), info));
                }
                annotations_attr(&mut cp, &mut attrs, &member.annotations);
                write_attrs(&mut body, attrs);
            }
        }

        let mut attrs = Vec::new();
        signature_attr(&mut cp, &mut attrs, self.signature.as_deref());
        annotations_attr(&mut cp, &mut attrs, &self.annotations);
        if !self.inner_classes.is_empty() {
            let mut info = Vec::new();
            push_u16(&mut info, self.inner_classes.len() as u16);
            for (inner, outer, name, flags) in &self.inner_classes {
                push_u16(&mut info, cp.class(inner));
                push_u16(&mut info, outer.as_deref().map_or(0, |o| cp.class(o)));
                push_u16(&mut info, name.as_deref().map_or(0, |n| cp.utf8(n)));
                push_u16(&mut info, *flags);
            }
            attrs.push((cp.utf8("InnerClasses"), info));
        }
        write_attrs(&mut body, attrs);

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        push_u16(&mut out, 0);
        push_u16(&mut out, MAJOR_JAVA_8);
        push_u16(&mut out, cp.count);
        out.extend_from_slice(&cp.bytes);
        out.extend_from_slice(&body);
        out
    }
}

struct Pool {
    bytes: Vec<u8>,
    count: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            count: 1,
            utf8: HashMap::new(),
            classes: HashMap::new(),
        }
    }
}

impl Pool {
    fn utf8(&mut self, s: &str) -> u16 {
        if let Some(&index) = self.utf8.get(s) {
            return index;
        }
        self.bytes.push(1);
        push_u16(&mut self.bytes, s.len() as u16);
        self.bytes.extend_from_slice(s.as_bytes());
        let index = self.next();
        self.utf8.insert(s.to_string(), index);
        index
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        if let Some(&index) = self.classes.get(internal_name) {
            return index;
        }
        let name_index = self.utf8(internal_name);
        self.bytes.push(7);
        push_u16(&mut self.bytes, name_index);
        let index = self.next();
        self.classes.insert(internal_name.to_string(), index);
        index
    }

    fn next(&mut self) -> u16 {
        let index = self.count;
        self.count += 1;
        index
    }
}

fn signature_attr(cp: &mut Pool, attrs: &mut Vec<(u16, Vec<u8>)>, signature: Option<&str>) {
    if let Some(signature) = signature {
        let mut info = Vec::new();
        push_u16(&mut info, cp.utf8(signature));
        attrs.push((cp.utf8("Signature"), info));
    }
}

fn annotations_attr(cp: &mut Pool, attrs: &mut Vec<(u16, Vec<u8>)>, annotations: &[String]) {
    if annotations.is_empty() {
        return;
    }
    let mut info = Vec::new();
    push_u16(&mut info, annotations.len() as u16);
    for descriptor in annotations {
        push_u16(&mut info, cp.utf8(descriptor));
        push_u16(&mut info, 0);
    }
    attrs.push((cp.utf8("RuntimeInvisibleAnnotations"), info));
}

fn write_attrs(out: &mut Vec<u8>, attrs: Vec<(u16, Vec<u8>)>) {
    push_u16(out, attrs.len() as u16);
    for (name_index, info) in attrs {
        push_u16(out, name_index);
        out.extend_from_slice(&(info.len() as u32).to_be_bytes());
        out.extend_from_slice(&info);
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}
