use compact_str::CompactString;

use super::signature::{FunctionSignature, SigId, TypeId};

/// Read-only capability interface over the host's symbol model.
///
/// The engine never mutates the model and never holds it across runs; it is
/// shared freely between reference-analysis workers, hence the `Sync` bound.
/// Identity handles (`SigId`, `TypeId`) are dense indices assigned by the
/// host; all lookups are infallible for handles the host produced.
pub trait Symbols: Sync {
    /// Signature for a function handle.
    fn signature(&self, id: SigId) -> &FunctionSignature;

    /// Display name of a declared type.
    fn type_name(&self, ty: TypeId) -> &str;

    /// Whether the declared type is an interface.
    fn is_interface(&self, ty: TypeId) -> bool;

    /// Direct base types.
    fn bases(&self, ty: TypeId) -> &[TypeId];

    /// Directly implemented interfaces.
    fn interfaces(&self, ty: TypeId) -> &[TypeId];

    /// Functions declared directly on the type.
    fn members(&self, ty: TypeId) -> &[SigId];

    /// Neighbors of the signature in the override / interface-implementation
    /// lattice.
    fn related(&self, id: SigId) -> &[SigId];

    /// Attributes present on the declaration.
    fn attributes(&self, id: SigId) -> &[CompactString];
}

/// Qualified `Type.function` display name for a signature.
#[must_use]
pub fn full_name(symbols: &dyn Symbols, id: SigId) -> String {
    let sig = symbols.signature(id);
    format!("{}.{}", symbols.type_name(sig.declaring_type), sig.name)
}

struct TypeEntry {
    name: CompactString,
    is_interface: bool,
    bases: Vec<TypeId>,
    interfaces: Vec<TypeId>,
    members: Vec<SigId>,
}

struct SigEntry {
    sig: FunctionSignature,
    related: Vec<SigId>,
    attributes: Vec<CompactString>,
}

/// Arena-backed implementation of [`Symbols`].
///
/// Hosts translate their native symbol model into this table once per run;
/// tests build small models with the `add_*` methods directly.
#[derive(Default)]
pub struct SymbolTable {
    types: Vec<TypeEntry>,
    functions: Vec<SigEntry>,
}

impl SymbolTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Declares a class-like type and returns its handle.
    pub fn add_type(&mut self, name: &str) -> TypeId {
        self.push_type(name, false)
    }

    /// Declares an interface type and returns its handle.
    pub fn add_interface(&mut self, name: &str) -> TypeId {
        self.push_type(name, true)
    }

    fn push_type(&mut self, name: &str, is_interface: bool) -> TypeId {
        let id = TypeId(u32::try_from(self.types.len()).unwrap_or(u32::MAX));
        self.types.push(TypeEntry {
            name: CompactString::from(name),
            is_interface,
            bases: Vec::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
        });
        id
    }

    /// Records `base` as a direct base of `ty`.
    pub fn add_base(&mut self, ty: TypeId, base: TypeId) {
        self.types[ty.0 as usize].bases.push(base);
    }

    /// Records `iface` as directly implemented by `ty`.
    pub fn add_implements(&mut self, ty: TypeId, iface: TypeId) {
        self.types[ty.0 as usize].interfaces.push(iface);
    }

    /// Declares a function and returns its handle.
    pub fn add_function(&mut self, sig: FunctionSignature) -> SigId {
        let id = SigId(u32::try_from(self.functions.len()).unwrap_or(u32::MAX));
        self.types[sig.declaring_type.0 as usize].members.push(id);
        self.functions.push(SigEntry {
            sig,
            related: Vec::new(),
            attributes: Vec::new(),
        });
        id
    }

    /// Links two signatures in the override / interface-implementation
    /// lattice. The relation is symmetric.
    pub fn relate(&mut self, a: SigId, b: SigId) {
        self.functions[a.0 as usize].related.push(b);
        self.functions[b.0 as usize].related.push(a);
    }

    /// Records an attribute on a declaration.
    pub fn add_attribute(&mut self, id: SigId, attribute: &str) {
        self.functions[id.0 as usize]
            .attributes
            .push(CompactString::from(attribute));
    }
}

impl Symbols for SymbolTable {
    fn signature(&self, id: SigId) -> &FunctionSignature {
        &self.functions[id.0 as usize].sig
    }

    fn type_name(&self, ty: TypeId) -> &str {
        &self.types[ty.0 as usize].name
    }

    fn is_interface(&self, ty: TypeId) -> bool {
        self.types[ty.0 as usize].is_interface
    }

    fn bases(&self, ty: TypeId) -> &[TypeId] {
        &self.types[ty.0 as usize].bases
    }

    fn interfaces(&self, ty: TypeId) -> &[TypeId] {
        &self.types[ty.0 as usize].interfaces
    }

    fn members(&self, ty: TypeId) -> &[SigId] {
        &self.types[ty.0 as usize].members
    }

    fn related(&self, id: SigId) -> &[SigId] {
        &self.functions[id.0 as usize].related
    }

    fn attributes(&self, id: SigId) -> &[CompactString] {
        &self.functions[id.0 as usize].attributes
    }
}
