//! Schema compiler
//!
//! [`compile`] walks a schema once and produces a tree of closures. Node
//! kind dispatch and configuration lookups happen during that walk:
//!
//! - string and number checks are folded into one pass/fail plan per node
//!   (length constraints into a single character range, numeric bounds
//!   into a single interval);
//! - objects hold a field table of compiled children instead of going back
//!   through [`Schema`];
//! - nodes free of user code and lazy schemas get an output builder, so an
//!   input that passes the boolean check has its output assembled without
//!   building paths, contexts or errors.
//!
//! Inputs that fail the check take the same traversal the schema nodes use
//! (`ObjectSchema::run`, `ArraySchema::run`, ...), parameterized by the
//! compiled children, so outputs, error codes, error order and paths are
//! identical to the interpreted schema. Lazy nodes are not expanded: they
//! delegate to the lazy schema's own entry points.
//!
//! ```rust,ignore
//! use warden_validator::prelude::*;
//!
//! let user = object! { name: string().min(1), age: number().int() };
//! let compiled = compile(user);
//! assert!(compiled.is(&Value::from(serde_json::json!({"name": "a", "age": 3}))));
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::combinators::{ModifiedSchema, Modifier};
use crate::foundation::{Validate, ValidationContext, ValidationResult};
use crate::schema::{Schema, SchemaKind};
use crate::security::object_guard;
use crate::validators::{
    ArraySchema, DiscriminatedUnionSchema, MapSchema, NumberSchema, ObjectSchema, RecordSchema,
    SetSchema, StringSchema, TupleSchema, UnionSchema, UnknownKeys, record_key,
};
use crate::value::{Object, UNDEFINED, Value};

type RunFn = dyn Fn(&Value, &ValidationContext) -> ValidationResult + Send + Sync;
type CheckFn = dyn Fn(&Value, usize) -> bool + Send + Sync;
type BuildFn = dyn Fn(&Value, usize) -> Value + Send + Sync;

/// Output of an input the node's check accepted.
#[derive(Clone)]
enum Output {
    /// The input itself.
    Same,
    Build(Arc<BuildFn>),
}

impl Output {
    fn build_with<B>(build: B) -> Self
    where
        B: Fn(&Value, usize) -> Value + Send + Sync + 'static,
    {
        Self::Build(Arc::new(build))
    }

    fn build(&self, value: &Value, depth: usize) -> Value {
        match self {
            Self::Same => value.clone(),
            Self::Build(build) => build(value, depth),
        }
    }

    const fn is_same(&self) -> bool {
        matches!(self, Self::Same)
    }
}

/// Outputs of every child, or `None` if one of them has none.
fn outputs<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Option<Vec<Output>> {
    nodes.into_iter().map(|node| node.output.clone()).collect()
}

/// One compiled node.
#[derive(Clone)]
struct Node {
    run: Arc<RunFn>,
    check: Arc<CheckFn>,
    /// `None` when only a full run knows the output (user code or a lazy
    /// schema below this node).
    output: Option<Output>,
}

impl Node {
    /// `run` reports errors. With an `output`, it is only reached for
    /// inputs the check rejects.
    fn new<R, C>(run: R, check: C, output: Option<Output>) -> Self
    where
        R: Fn(&Value, &ValidationContext) -> ValidationResult + Send + Sync + 'static,
        C: Fn(&Value, usize) -> bool + Send + Sync + 'static,
    {
        let check: Arc<CheckFn> = Arc::new(check);
        let run: Arc<RunFn> = match &output {
            Some(fast) => {
                let (accepts, fast) = (Arc::clone(&check), fast.clone());
                Arc::new(move |v: &Value, c: &ValidationContext| {
                    if accepts(v, c.depth()) {
                        Ok(fast.build(v, c.depth()))
                    } else {
                        run(v, c)
                    }
                })
            }
            None => Arc::new(run),
        };
        Self { run, check, output }
    }

    /// A leaf whose output is its input.
    fn leaf<V>(validator: V) -> Self
    where
        V: Validate + 'static,
    {
        let validator = Arc::new(validator);
        let for_check = Arc::clone(&validator);
        Self::new(
            move |v, c| validator.validate_in(v, c),
            move |v, d| for_check.is_in(v, d),
            Some(Output::Same),
        )
    }
}

/// Node counts of a compiled validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Every schema node visited.
    pub nodes: usize,
    /// Nodes turned into dedicated closures.
    pub specialized: usize,
    /// Nodes left to their own `validate`/`is` (lazy schemas).
    pub delegated: usize,
    /// Specialized nodes that build the output of an accepted input
    /// directly.
    pub fast_path: usize,
}

#[derive(Default)]
struct Compiler {
    stats: CompileStats,
}

impl Compiler {
    fn node(&mut self, schema: &Schema) -> Node {
        self.stats.nodes += 1;
        let node = match schema.kind() {
            SchemaKind::Lazy(lazy) => {
                self.stats.delegated += 1;
                let (run, check) = (lazy.clone(), lazy.clone());
                return Node::new(
                    move |v, c| run.validate_in(v, c),
                    move |v, d| check.is_in(v, d),
                    None,
                );
            }
            SchemaKind::String(s) => Self::string(s),
            SchemaKind::Number(s) => Self::number(s),
            SchemaKind::BigInt(s) => Node::leaf(s.clone()),
            SchemaKind::Date(s) => Node::leaf(*s),
            SchemaKind::Literal(s) => Node::leaf(s.clone()),
            SchemaKind::Enum(s) => Node::leaf(s.clone()),
            SchemaKind::NativeEnum(s) => Node::leaf(s.clone()),
            SchemaKind::Primitive(s) => Node::leaf(*s),
            SchemaKind::Object(s) => self.object(s),
            SchemaKind::Array(s) => self.array(s),
            SchemaKind::Tuple(s) => self.tuple(s),
            SchemaKind::Record(s) => self.record(s),
            SchemaKind::Map(s) => self.map(s),
            SchemaKind::Set(s) => self.set(s),
            SchemaKind::Union(s) => self.union(s),
            SchemaKind::DiscriminatedUnion(s) => self.discriminated_union(s),
            SchemaKind::Intersection(s) => {
                let branches: Arc<[Node]> = s.branches().iter().map(|b| self.node(b)).collect();
                let schema = s.clone();
                let run: Arc<RunFn> = Arc::new(move |v: &Value, c: &ValidationContext| {
                    schema.run(v, c, |i, v, c| (branches[i].run)(v, c))
                });
                let full = Arc::clone(&run);
                Node::new(
                    move |v, c| run(v, c),
                    move |v, d| full(v, &ValidationContext::with_depth(d)).is_ok(),
                    None,
                )
            }
            SchemaKind::Modified(s) => self.modified(s),
        };
        self.specialized(node)
    }

    fn specialized(&mut self, node: Node) -> Node {
        self.stats.specialized += 1;
        if node.output.is_some() {
            self.stats.fast_path += 1;
        }
        node
    }

    // ------------------------------------------------------------------------
    // Leaves
    // ------------------------------------------------------------------------

    fn string(s: &StringSchema) -> Node {
        let plan = s.plan();
        let output = if s.has_transforms() {
            let schema = s.clone();
            Output::build_with(move |v, _| match v {
                Value::String(input) => schema.output(input),
                other => other.clone(),
            })
        } else {
            Output::Same
        };
        let schema = s.clone();
        Node::new(
            move |v, c| schema.validate_in(v, c),
            move |v, _| matches!(v, Value::String(input) if plan.accepts(input)),
            Some(output),
        )
    }

    fn number(s: &NumberSchema) -> Node {
        let plan = s.plan();
        let schema = s.clone();
        Node::new(
            move |v, c| schema.validate_in(v, c),
            move |v, _| matches!(v, Value::Number(n) if plan.accepts(*n)),
            Some(Output::Same),
        )
    }

    // ------------------------------------------------------------------------
    // Containers
    // ------------------------------------------------------------------------

    fn object(&mut self, s: &ObjectSchema) -> Node {
        let table: Arc<[(String, Node)]> = s
            .shape()
            .iter()
            .map(|(key, field)| (key.clone(), self.node(field)))
            .collect();

        let run_schema = s.clone();
        let run_table = Arc::clone(&table);
        let run = move |v: &Value, c: &ValidationContext| {
            run_schema.run(v, c, |i, v, c| (run_table[i].1.run)(v, c))
        };

        let declared = s.clone();
        let check_table = Arc::clone(&table);
        let check = move |v: &Value, d: usize| {
            let Value::Object(input) = v else {
                return false;
            };
            let limits = declared.security_limits();
            object_guard::check_object(input, d, limits).is_ok()
                && check_table
                    .iter()
                    .all(|(key, node)| (node.check)(input.get(key).unwrap_or(&UNDEFINED), d + 1))
                && match declared.unknown_keys() {
                    UnknownKeys::Strip => true,
                    UnknownKeys::Passthrough => input
                        .iter()
                        .filter(|(k, _)| !declared.shape().contains_key(*k))
                        .all(|(_, v)| object_guard::scan_ok(v, d + 1, limits)),
                    UnknownKeys::Strict => input.keys().all(|k| declared.shape().contains_key(k)),
                }
        };

        let output = outputs(table.iter().map(|(_, node)| node)).map(|fields| {
            let declared = s.clone();
            let keys: Vec<String> = table.iter().map(|(key, _)| key.clone()).collect();
            Output::build_with(move |v, d| {
                let Value::Object(input) = v else {
                    return v.clone();
                };
                let mut out = Object::with_capacity(keys.len());
                for (key, field) in keys.iter().zip(&fields) {
                    let value = field.build(input.get(key).unwrap_or(&UNDEFINED), d + 1);
                    if !value.is_undefined() {
                        out.insert(key.clone(), value);
                    }
                }
                if declared.unknown_keys() == UnknownKeys::Passthrough {
                    for (key, value) in input.iter() {
                        if !declared.shape().contains_key(key) {
                            out.insert(key.clone(), value.clone());
                        }
                    }
                }
                Value::from(out)
            })
        });

        Node::new(run, check, output)
    }

    fn array(&mut self, s: &ArraySchema) -> Node {
        let element = self.node(s.element());
        let (run_schema, check_schema) = (s.clone(), s.clone());
        let (run_el, check_el) = (element.run, element.check);
        let output = element.output.map(|el| {
            if el.is_same() {
                return Output::Same;
            }
            Output::build_with(move |v, d| match v {
                Value::Array(items) => {
                    Value::from(items.iter().map(|item| el.build(item, d + 1)).collect::<Vec<_>>())
                }
                other => other.clone(),
            })
        });
        Node::new(
            move |v, c| run_schema.run(v, c, |v, c| run_el(v, c)),
            move |v, d| check_schema.check(v, d, |v, d| check_el(v, d)),
            output,
        )
    }

    fn tuple(&mut self, s: &TupleSchema) -> Node {
        let items: Arc<[Node]> = s.items().iter().map(|i| self.node(i)).collect();
        let rest = s.rest_schema().map(|r| self.node(r));

        let output = outputs(items.iter().chain(rest.as_ref())).map(|mut positional| {
            let rest_output = rest.as_ref().and_then(|_| positional.pop());
            if positional.iter().chain(rest_output.as_ref()).all(Output::is_same) {
                return Output::Same;
            }
            Output::build_with(move |v, d| match v {
                Value::Array(elements) => Value::from(
                    elements
                        .iter()
                        .enumerate()
                        .map(|(i, element)| match positional.get(i).or(rest_output.as_ref()) {
                            Some(output) => output.build(element, d + 1),
                            None => element.clone(),
                        })
                        .collect::<Vec<_>>(),
                ),
                other => other.clone(),
            })
        });

        let (run_schema, check_schema) = (s.clone(), s.clone());
        let (run_items, run_rest) = (Arc::clone(&items), rest.clone());
        Node::new(
            move |v, c| {
                run_schema.run(v, c, |i, v, c| {
                    match run_items.get(i).or(run_rest.as_ref()) {
                        Some(node) => (node.run)(v, c),
                        None => Ok(v.clone()),
                    }
                })
            },
            move |v, d| {
                check_schema.check(v, d, |i, v, d| {
                    items
                        .get(i)
                        .or(rest.as_ref())
                        .is_some_and(|node| (node.check)(v, d))
                })
            },
            output,
        )
    }

    fn record(&mut self, s: &RecordSchema) -> Node {
        let key = s.key_schema().map(|k| self.node(k));
        let value = self.node(s.value_schema());

        let key_output = match &key {
            Some(node) => node.output.clone().map(Some),
            None => Some(None),
        };
        let output = key_output.zip(value.output.clone()).map(|(key_output, value_output)| {
            Output::build_with(move |v, d| {
                let Value::Object(input) = v else {
                    return v.clone();
                };
                let mut out = Object::with_capacity(input.len());
                for (k, item) in input.iter() {
                    let out_key = match &key_output {
                        Some(output) => {
                            let renamed = output.build(&Value::from(k.as_str()), d + 1);
                            record_key(k, &renamed)
                        }
                        None => k.clone(),
                    };
                    let item = value_output.build(item, d + 1);
                    if !item.is_undefined() {
                        out.insert(out_key, item);
                    }
                }
                Value::from(out)
            })
        });

        let (run_schema, check_schema) = (s.clone(), s.clone());
        let (run_key, check_key) = (key.clone(), key);
        let (run_value, check_value) = (value.run, value.check);
        Node::new(
            move |v, c| {
                run_schema.run(
                    v,
                    c,
                    |k, c| match &run_key {
                        Some(node) => (node.run)(k, c),
                        None => Ok(k.clone()),
                    },
                    |v, c| run_value(v, c),
                )
            },
            move |v, d| {
                check_schema.check(
                    v,
                    d,
                    |k, d| check_key.as_ref().is_none_or(|node| (node.check)(k, d)),
                    |v, d| check_value(v, d),
                )
            },
            output,
        )
    }

    fn map(&mut self, s: &MapSchema) -> Node {
        let key = self.node(s.key_schema());
        let value = self.node(s.value_schema());
        let pair = key.output.clone().zip(value.output.clone());
        let output = pair.map(|(key_output, value_output)| {
            if key_output.is_same() && value_output.is_same() {
                return Output::Same;
            }
            Output::build_with(move |v, d| match v {
                Value::Map(entries) => Value::map(
                    entries
                        .iter()
                        .map(|(k, item)| {
                            (key_output.build(k, d + 1), value_output.build(item, d + 1))
                        })
                        .collect::<Vec<_>>(),
                ),
                other => other.clone(),
            })
        });
        let (run_schema, check_schema) = (s.clone(), s.clone());
        let (run_key, check_key) = (key.run, key.check);
        let (run_value, check_value) = (value.run, value.check);
        Node::new(
            move |v, c| run_schema.run(v, c, |k, c| run_key(k, c), |v, c| run_value(v, c)),
            move |v, d| check_schema.check(v, d, |k, d| check_key(k, d), |v, d| check_value(v, d)),
            output,
        )
    }

    fn set(&mut self, s: &SetSchema) -> Node {
        let element = self.node(s.element());
        // rebuilt even for identical elements: the output set is deduplicated
        let output = element.output.map(|el| {
            Output::build_with(move |v, d| match v {
                Value::Set(items) => Value::set(items.iter().map(|item| el.build(item, d + 1))),
                other => other.clone(),
            })
        });
        let (run_schema, check_schema) = (s.clone(), s.clone());
        let (run_el, check_el) = (element.run, element.check);
        Node::new(
            move |v, c| run_schema.run(v, c, |v, c| run_el(v, c)),
            move |v, d| check_schema.check(v, d, |v, d| check_el(v, d)),
            output,
        )
    }

    // ------------------------------------------------------------------------
    // Unions and modifiers
    // ------------------------------------------------------------------------

    fn union(&mut self, s: &UnionSchema) -> Node {
        let options: Arc<[Node]> = s.options().iter().map(|o| self.node(o)).collect();
        let output = outputs(options.iter()).map(|option_outputs| {
            let checks: Vec<Arc<CheckFn>> = options.iter().map(|o| Arc::clone(&o.check)).collect();
            // the first accepted option produces the output, as in the full run
            Output::build_with(move |v, d| {
                match checks.iter().position(|accepts| accepts(v, d)) {
                    Some(i) => option_outputs[i].build(v, d),
                    None => v.clone(),
                }
            })
        });
        let (run_schema, check_schema) = (s.clone(), s.clone());
        let run_options = Arc::clone(&options);
        Node::new(
            move |v, c| run_schema.run(v, c, |i, v, c| (run_options[i].run)(v, c)),
            move |v, d| check_schema.check(v, d, |i, v, d| (options[i].check)(v, d)),
            output,
        )
    }

    fn discriminated_union(&mut self, s: &DiscriminatedUnionSchema) -> Node {
        let options: Arc<[Node]> = s
            .options()
            .iter()
            .map(|o| {
                self.stats.nodes += 1;
                let node = self.object(o);
                self.specialized(node)
            })
            .collect();
        let output = outputs(options.iter()).map(|option_outputs| {
            let schema = s.clone();
            Output::build_with(move |v, d| match v {
                Value::Object(input) => match schema.select(input) {
                    Some(i) => option_outputs[i].build(v, d),
                    None => v.clone(),
                },
                other => other.clone(),
            })
        });
        let (run_schema, check_schema) = (s.clone(), s.clone());
        let run_options = Arc::clone(&options);
        Node::new(
            move |v, c| run_schema.run(v, c, |i, v, c| (run_options[i].run)(v, c)),
            move |v, d| check_schema.check(v, d, |i, v, d| (options[i].check)(v, d)),
            output,
        )
    }

    fn modified(&mut self, s: &ModifiedSchema) -> Node {
        let inner = self.node(s.inner());
        let next = match s.modifier() {
            Modifier::Pipe(next) => Some(self.node(next)),
            _ => None,
        };
        let output = Self::modified_output(s.modifier(), &inner);

        let schema = s.clone();
        let inner_run = Arc::clone(&inner.run);
        let run: Arc<RunFn> = Arc::new(move |v: &Value, c: &ValidationContext| {
            schema.run(
                v,
                c,
                |v, c| inner_run(v, c),
                |v, c| match &next {
                    Some(node) => (node.run)(v, c),
                    None => Ok(v.clone()),
                },
            )
        });
        let check_schema = s.clone();
        let inner_check = inner.check;
        let full = Arc::clone(&run);
        Node::new(
            move |v, c| run(v, c),
            move |v, d| {
                check_schema.check(
                    v,
                    d,
                    |v, d| inner_check(v, d),
                    || full(v, &ValidationContext::with_depth(d)).is_ok(),
                )
            },
            output,
        )
    }

    /// Modifiers that run user code have no output builder.
    fn modified_output(modifier: &Modifier, inner: &Node) -> Option<Output> {
        let inner_output = inner.output.clone()?;
        let output = match modifier {
            Modifier::Optional | Modifier::Nullable | Modifier::Nullish
                if inner_output.is_same() =>
            {
                Output::Same
            }
            Modifier::Optional => Output::build_with(move |v, d| {
                if v.is_undefined() {
                    Value::Undefined
                } else {
                    inner_output.build(v, d)
                }
            }),
            Modifier::Nullable => Output::build_with(move |v, d| {
                if v.is_null() {
                    Value::Null
                } else {
                    inner_output.build(v, d)
                }
            }),
            Modifier::Nullish => Output::build_with(move |v, d| {
                if v.is_undefined() || v.is_null() {
                    v.clone()
                } else {
                    inner_output.build(v, d)
                }
            }),
            Modifier::Default(fallback) => {
                let fallback = fallback.clone();
                Output::build_with(move |v, d| {
                    if v.is_undefined() {
                        inner_output.build(&fallback, d)
                    } else {
                        inner_output.build(v, d)
                    }
                })
            }
            Modifier::Catch(fallback) => {
                let fallback = fallback.clone();
                let accepts = Arc::clone(&inner.check);
                Output::build_with(move |v, d| {
                    if accepts(v, d) {
                        inner_output.build(v, d)
                    } else {
                        fallback.clone()
                    }
                })
            }
            Modifier::Message(_)
            | Modifier::RefineAsync { .. }
            | Modifier::TransformAsync(_)
            | Modifier::PreprocessAsync(_) => inner_output,
            Modifier::Refine { .. }
            | Modifier::SuperRefine(_)
            | Modifier::Transform(_)
            | Modifier::Preprocess(_)
            | Modifier::Pipe(_) => return None,
        };
        Some(output)
    }
}

/// A schema turned into a tree of closures.
///
/// Behaves exactly like its source schema; `validate_async` runs the source
/// schema's async path.
#[derive(Clone)]
pub struct CompiledValidator {
    root: Node,
    source: Schema,
    stats: CompileStats,
}

/// Compiles `schema`. The schema is shared, never modified; compiling the
/// same schema twice yields two independent validators.
pub fn compile(schema: impl Into<Schema>) -> CompiledValidator {
    let source = schema.into();
    let mut compiler = Compiler::default();
    let root = compiler.node(&source);
    let stats = compiler.stats;
    tracing::debug!(
        kind = source.kind().name(),
        nodes = stats.nodes,
        specialized = stats.specialized,
        delegated = stats.delegated,
        fast_path = stats.fast_path,
        "schema compiled"
    );
    CompiledValidator { root, source, stats }
}

impl CompiledValidator {
    /// The schema this validator was compiled from.
    #[must_use]
    pub const fn source(&self) -> &Schema {
        &self.source
    }

    #[must_use]
    pub const fn stats(&self) -> CompileStats {
        self.stats
    }
}

impl fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("source", &self.source)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Validate for CompiledValidator {
    fn validate_in(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult {
        (self.root.run)(value, ctx)
    }

    fn is_in(&self, value: &Value, depth: usize) -> bool {
        (self.root.check)(value, depth)
    }

    fn validate_async_in<'a>(
        &'a self,
        value: &'a Value,
        ctx: ValidationContext,
    ) -> BoxFuture<'a, ValidationResult> {
        self.source.validate_async_in(value, ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::combinators::{SchemaExt, lazy};
    use crate::foundation::ErrorCode;
    use crate::validators::{
        array, discriminated_union, literal, map, number, object, record, set, string, union,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user() -> Schema {
        object([
            ("name", Schema::from(string().min(1))),
            ("age", number().int().optional()),
            ("tags", array(string()).into()),
        ])
        .strict()
        .into()
    }

    fn agree(schema: impl Into<Schema>, inputs: &[Value]) {
        let schema = schema.into();
        let compiled = compile(schema.clone());
        for input in inputs {
            assert_eq!(compiled.validate(input), schema.validate(input), "{input}");
            assert_eq!(compiled.is(input), schema.is(input), "{input}");
        }
    }

    #[test]
    fn test_counts_nodes() {
        let compiled = compile(user());
        // object, string, optional, number, array, string
        assert_eq!(
            compiled.stats(),
            CompileStats {
                nodes: 6,
                specialized: 6,
                delegated: 0,
                fast_path: 6,
            }
        );
    }

    #[test]
    fn test_counts_discriminated_union_options() {
        let schema = discriminated_union(
            "kind",
            [
                object([("kind", Schema::from(literal("a"))), ("x", number().into())]),
                object([("kind", Schema::from(literal("b"))), ("y", string().into())]),
            ],
        )
        .unwrap();
        // union, two option objects, two fields each
        assert_eq!(
            compile(schema).stats(),
            CompileStats {
                nodes: 7,
                specialized: 7,
                delegated: 0,
                fast_path: 7,
            }
        );
    }

    #[test]
    fn test_lazy_nodes_are_delegated() {
        let compiled = compile(array(lazy(string)));
        assert_eq!(compiled.stats().delegated, 1);
        assert_eq!(compiled.stats().fast_path, 0);
        assert!(compiled.is(&Value::from(json!(["a"]))));
        assert!(!compiled.is(&Value::from(json!([1]))));
    }

    #[test]
    fn test_matches_interpreted_errors() {
        let schema = user();
        let compiled = compile(schema.clone());
        let input = Value::from(json!({"name": "", "age": 1.5, "tags": ["a", 2], "x": 1}));
        let expected = schema.validate(&input).unwrap_err();
        let actual = compiled.validate(&input).unwrap_err();
        assert_eq!(actual, expected);
        assert_eq!(
            actual.codes(),
            vec![
                ErrorCode::StringTooShort,
                ErrorCode::NumberNotInteger,
                ErrorCode::NotString,
                ErrorCode::ObjectUnknownKey,
            ]
        );
    }

    #[test]
    fn test_modifiers_compile() {
        let schema = string()
            .trim()
            .refine(|v| v.as_str().is_some_and(|s| s.len() > 1), "too short")
            .catch("fallback");
        let compiled = compile(schema.clone());
        for input in [Value::from(" ab "), Value::from(" a "), Value::Null] {
            assert_eq!(compiled.validate(&input), schema.validate(&input));
            assert!(compiled.is(&input));
        }
        assert_eq!(compiled.validate(&Value::Null).unwrap(), Value::from("fallback"));
    }

    #[test]
    fn test_built_outputs_match_interpreted() {
        agree(
            object([
                ("name", Schema::from(string().trim().to_lowercase())),
                ("role", string().default("user")),
                ("score", number().catch(0)),
                ("note", string().nullish()),
            ])
            .passthrough(),
            &[
                Value::from(json!({"name": " Ada ", "extra": [1]})),
                Value::from(json!({"name": "x", "role": "admin", "score": "high", "note": null})),
                Value::from(json!({"name": 1})),
            ],
        );
        agree(
            record(number()).keys(string().to_uppercase()),
            &[Value::from(json!({"a": 1, "A": 2})), Value::from(json!({"a": "x"}))],
        );
        agree(
            set(string().to_lowercase()),
            &[Value::set(["A", "a", "b"]), Value::set([Value::from(1)])],
        );
        agree(
            map(string().trim(), number()),
            &[Value::map([(Value::from(" k "), Value::from(1))])],
        );
        agree(
            union([Schema::from(string().trim()), Schema::from(string())]),
            &[Value::from(" a "), Value::from(1)],
        );
    }

    #[test]
    fn test_user_code_runs_once_per_validation() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let schema = object([(
            "name",
            string().transform(|v| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                v.clone()
            }),
        )]);
        let compiled = compile(schema);
        assert_eq!(compiled.stats().fast_path, 1);

        let output = compiled.validate(&Value::from(json!({"name": "ada"}))).unwrap();
        assert_eq!(output, Value::from(json!({"name": "ada"})));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_runs_the_source_schema() {
        let schema = string().refine_async(|v| async move { v.as_str() == Some("ok") }, "nope");
        let compiled = compile(schema);
        assert!(compiled.validate_async(&Value::from("ok")).await.is_ok());
        let err = compiled.validate_async(&Value::from("ko")).await.unwrap_err();
        assert_eq!(err.codes(), vec![ErrorCode::RefinementFailed]);
        assert!(compiled.is(&Value::from("ko")));
    }
}
