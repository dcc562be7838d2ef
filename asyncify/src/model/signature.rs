use compact_str::CompactString;
use smallvec::SmallVec;

/// Interned identity of a declared type in the symbol model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Interned identity of a function signature in the symbol model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SigId(pub u32);

/// Structural reference to a type as it appears in a signature.
///
/// Wrapper ("deferred result") types never appear here as names: the return
/// position encodes them structurally through [`ReturnShape::Wrapped`], which
/// keeps the matcher independent of what the host calls its wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A named type, possibly with type arguments.
    Named {
        /// Simple type name as the host spells it.
        name: CompactString,
        /// Type arguments, empty for non-generic types.
        args: Vec<TypeRef>,
    },
    /// A reference to a type parameter of the enclosing signature.
    Param(CompactString),
    /// A delegate/callback type described by its invoke signature.
    Delegate {
        /// Parameter types of the delegate's invoke signature.
        params: Vec<TypeRef>,
        /// Return shape of the delegate's invoke signature.
        returns: Box<ReturnShape>,
    },
}

impl TypeRef {
    /// A non-generic named type.
    #[must_use]
    pub fn named(name: &str) -> Self {
        TypeRef::Named {
            name: CompactString::from(name),
            args: Vec::new(),
        }
    }

    /// A generic named type with arguments.
    #[must_use]
    pub fn generic(name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: CompactString::from(name),
            args,
        }
    }

    /// A delegate type from its invoke signature.
    #[must_use]
    pub fn delegate(params: Vec<TypeRef>, returns: ReturnShape) -> Self {
        TypeRef::Delegate {
            params,
            returns: Box::new(returns),
        }
    }
}

/// Return-type descriptor: void, a plain value, or wrapper-of(value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    /// No value is produced.
    Void,
    /// A synchronously produced value.
    Value(TypeRef),
    /// A deferred result; `None` is the bare wrapper ("deferred void").
    Wrapped(Option<TypeRef>),
}

impl ReturnShape {
    /// Wrapper-of(value) for a value type.
    #[must_use]
    pub fn wrapped(value: TypeRef) -> Self {
        ReturnShape::Wrapped(Some(value))
    }

    /// Whether this shape is a deferred result.
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        matches!(self, ReturnShape::Wrapped(_))
    }
}

/// Passing mode of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    /// Passed by value.
    Value,
    /// Passed by mutable reference.
    ByRef,
    /// Output parameter.
    Out,
}

/// One ordered parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: CompactString,
    /// Declared type.
    pub ty: TypeRef,
    /// Passing mode.
    pub mode: ParamMode,
    /// Whether the parameter has a default value.
    pub optional: bool,
    /// Whether the parameter is variadic.
    pub variadic: bool,
}

impl Parameter {
    /// A plain by-value, non-optional, non-variadic parameter.
    #[must_use]
    pub fn value(name: &str, ty: TypeRef) -> Self {
        Parameter {
            name: CompactString::from(name),
            ty,
            mode: ParamMode::Value,
            optional: false,
            variadic: false,
        }
    }

    /// Marks the parameter optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the parameter variadic.
    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Sets the passing mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ParamMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Variance of a type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    /// Invariant.
    Invariant,
    /// Covariant (`out`).
    Covariant,
    /// Contravariant (`in`).
    Contravariant,
}

/// One type parameter of a generic signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    /// Type parameter name.
    pub name: CompactString,
    /// Declared variance.
    pub variance: Variance,
    /// Constraint names. Compared as a set, positionally per parameter.
    pub constraints: SmallVec<[CompactString; 2]>,
}

impl TypeParam {
    /// An invariant, unconstrained type parameter.
    #[must_use]
    pub fn new(name: &str) -> Self {
        TypeParam {
            name: CompactString::from(name),
            variance: Variance::Invariant,
            constraints: SmallVec::new(),
        }
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constrained(mut self, constraint: &str) -> Self {
        self.constraints.push(CompactString::from(constraint));
        self
    }
}

/// Member visibility, as far as counterpart lookup cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Visible from any type.
    Public,
    /// Visible only from the declaring type.
    Private,
}

/// An immutable function signature from the symbol model.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Simple function name.
    pub name: CompactString,
    /// Ordered parameters.
    pub params: Vec<Parameter>,
    /// Type parameters, empty for non-generic functions.
    pub type_params: Vec<TypeParam>,
    /// Return-type descriptor.
    pub returns: ReturnShape,
    /// The type declaring this function.
    pub declaring_type: TypeId,
    /// Visibility of the member.
    pub visibility: Visibility,
    /// Whether this is a member declared on an interface.
    pub is_interface_member: bool,
    /// Whether this declaration overrides a base member.
    pub is_override: bool,
}

impl FunctionSignature {
    /// A public, non-generic, non-interface signature.
    #[must_use]
    pub fn new(name: &str, declaring_type: TypeId, params: Vec<Parameter>, returns: ReturnShape) -> Self {
        FunctionSignature {
            name: CompactString::from(name),
            params,
            type_params: Vec::new(),
            returns,
            declaring_type,
            visibility: Visibility::Public,
            is_interface_member: false,
            is_override: false,
        }
    }

    /// Sets visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Adds type parameters.
    #[must_use]
    pub fn with_type_params(mut self, type_params: Vec<TypeParam>) -> Self {
        self.type_params = type_params;
        self
    }

    /// Marks the signature as an interface member.
    #[must_use]
    pub fn as_interface_member(mut self) -> Self {
        self.is_interface_member = true;
        self
    }

    /// Marks the signature as an override.
    #[must_use]
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self
    }
}
