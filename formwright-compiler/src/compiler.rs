//! The schema-to-form compiler.

use std::any::Any;
use std::sync::Arc;

use formwright_schema::{
    PropertySchema, SchemaCache, SchemaDefinition, SchemaError, SchemaProvider, SchemaTarget,
    SingleFlight,
};
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{Instrument, debug, instrument, trace, warn};

use crate::config::CompilerConfig;
use crate::customizer::{CustomizeContext, Customized, Customizer};
use crate::error::{CompileError, CompileResult};
use crate::field::{FieldConfig, FieldKind, FieldProps, InputType, OptionSource, SelectOption};
use crate::fieldset::accumulate;
use crate::kind::{input_type, numeric_bounds, select_kind, step};
use crate::resolve::{CompiledFields, Scope, composition_targets, property_targets};
use crate::validators;

/// Key of the root group.
pub const ROOT_KEY: &str = "root";

/// Per-call build options.
#[derive(Clone, Default)]
pub struct CompileOptions {
    label_prefix: Option<String>,
    customizer: Option<Arc<dyn Customizer>>,
    context: Option<Arc<dyn Any + Send + Sync>>,
}

impl CompileOptions {
    /// Options with no prefix, customizer or context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for generated label and message keys.
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = Some(prefix.into());
        self
    }

    /// Hook run on every compiled field and on the root.
    pub fn with_customizer(mut self, customizer: Arc<dyn Customizer>) -> Self {
        self.customizer = Some(customizer);
        self
    }

    /// Opaque host value handed to the customizer.
    pub fn with_context(mut self, context: Arc<dyn Any + Send + Sync>) -> Self {
        self.context = Some(context);
        self
    }

    /// The label prefix, if set and non-empty.
    pub fn label_prefix(&self) -> Option<&str> {
        self.label_prefix.as_deref().filter(|p| !p.is_empty())
    }

    /// The customizer, if any.
    pub fn customizer(&self) -> Option<&Arc<dyn Customizer>> {
        self.customizer.as_ref()
    }

    /// The host value, if any.
    pub fn context(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.context.as_deref()
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("label_prefix", &self.label_prefix)
            .field("customizer", &self.customizer.is_some())
            .field("context", &self.context.is_some())
            .finish()
    }
}

/// State shared by every step of one `compile` call.
struct Session<'a> {
    options: &'a CompileOptions,
    prefix: Option<&'a str>,
    /// Named sub-schemas already compiled in this call, keyed by
    /// [`Scope::memo_key`]. Off when a customizer runs, since it sees
    /// field paths.
    memo: Option<SingleFlight<String, CompiledFields>>,
}

/// Compiles named schemas into field trees.
///
/// The compiler reads schemas through a [`SchemaCache`], so repeated and
/// concurrent compilations share fetches. Evicting the cache between form
/// sessions is up to the caller.
#[derive(Debug, Clone)]
pub struct SchemaFormCompiler {
    cache: Arc<SchemaCache>,
    config: CompilerConfig,
}

impl SchemaFormCompiler {
    /// Create a compiler over an existing cache.
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self {
            cache,
            config: CompilerConfig::default(),
        }
    }

    /// Create a compiler with a fresh cache over a provider.
    pub fn from_provider(provider: Arc<dyn SchemaProvider>) -> Self {
        Self::new(Arc::new(SchemaCache::new(provider)))
    }

    /// Replace the compiler settings.
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// The schema cache shared by compilations.
    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Current settings.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a named schema into a root group.
    ///
    /// A missing schema yields an empty root group unless strict mode is on.
    /// Dangling and recursive references compile to empty sub-trees.
    ///
    /// A schema referenced from several places is compiled once per call
    /// and copied, so reference DAGs with heavy fan-out stay cheap to
    /// build. The returned tree still holds one copy per reference, which
    /// grows with the fan-out up to `max_depth` levels.
    #[instrument(skip_all, fields(schema = %schema_name))]
    pub async fn compile(
        &self,
        schema_name: &str,
        options: &CompileOptions,
    ) -> CompileResult<FieldConfig> {
        let session = Session {
            options,
            prefix: options
                .label_prefix()
                .or(self.config.label_prefix.as_deref()),
            memo: options.customizer().is_none().then(SingleFlight::new),
        };

        let Some(definition) = self.cache.get(schema_name).await? else {
            if self.config.strict_schemas {
                return Err(SchemaError::not_found(schema_name).into());
            }
            warn!(schema = %schema_name, "Schema not found, compiling an empty form");
            return Ok(FieldConfig::group(ROOT_KEY, Vec::new()));
        };

        let compiled = self
            .compile_schema(Arc::clone(&definition), Scope::root(schema_name), &session)
            .await?;

        let mut root = self.group(ROOT_KEY, compiled);
        self.prepend_identity_fields(&mut root);

        debug!(fields = root.field_group.len(), sets = root.field_sets.len(), "Compiled form");
        self.customize_root(root, &definition, &session).await
    }

    fn compile_schema<'a>(
        &'a self,
        definition: Arc<SchemaDefinition>,
        scope: Scope,
        session: &'a Session<'a>,
    ) -> BoxFuture<'a, CompileResult<CompiledFields>> {
        let span = tracing::debug_span!("schema", name = %definition.name, path = %scope.path);
        async move {
            let mut parts = Vec::with_capacity(2);

            let composed = composition_targets(&definition);
            if !composed.is_empty() {
                parts.push(self.expand(composed, scope.compose(), session).await?);
            }

            let mut own = CompiledFields::default();
            for property in definition.properties.values() {
                let Some(kind) = select_kind(property) else {
                    trace!(property = %property.id, "Dropping property without a field kind");
                    continue;
                };

                let field = self
                    .build_field(kind, property, &definition, &scope, session)
                    .await?;
                let path = scope.path_of(&property.id);
                let results = self
                    .customize(field, property, &definition, &path, session)
                    .await?;

                let field_set = property.visible_field_set().map(SmolStr::new);
                for result in results {
                    let assignment = if result.key == property.id {
                        field_set.clone()
                    } else {
                        None
                    };
                    own.push(result, assignment);
                }
            }
            parts.push(own);

            Ok(CompiledFields::merge(parts))
        }
        .instrument(span)
        .boxed()
    }

    async fn build_field(
        &self,
        kind: FieldKind,
        property: &PropertySchema,
        definition: &SchemaDefinition,
        scope: &Scope,
        session: &Session<'_>,
    ) -> CompileResult<FieldConfig> {
        let mut field = FieldConfig::new(property.id.clone(), kind);
        field.validators =
            validators::synthesize(property, definition.is_required(&property.id), session.prefix);
        let required = field.validators.contains_key("required");
        field.props = self.props_for(kind, property, required, session.prefix);
        field.default_value = property.default.clone();

        if kind.is_container() {
            let targets = property_targets(property, definition);
            let nested = self.expand(targets, scope.descend(&property.id), session).await?;
            let group = self.group("", nested);
            if kind == FieldKind::Array {
                field.field_array = Some(Box::new(group));
            } else {
                field.field_group = group.field_group;
                field.field_sets = group.field_sets;
            }
        }

        Ok(field)
    }

    async fn expand(
        &self,
        targets: Vec<SchemaTarget>,
        scope: Scope,
        session: &Session<'_>,
    ) -> CompileResult<CompiledFields> {
        let parts = try_join_all(
            targets
                .into_iter()
                .map(|target| self.expand_target(target, &scope, session)),
        )
        .await?;
        Ok(CompiledFields::merge(parts))
    }

    async fn expand_target(
        &self,
        target: SchemaTarget,
        scope: &Scope,
        session: &Session<'_>,
    ) -> CompileResult<CompiledFields> {
        if scope.depth > self.config.max_depth {
            warn!(
                schema = %target.name(),
                path = %scope.path,
                max_depth = self.config.max_depth,
                "Reference nesting too deep, skipping"
            );
            return Ok(CompiledFields::default());
        }

        match target {
            SchemaTarget::Named(name) => {
                if scope.is_cycle(&name) {
                    warn!(
                        schema = %name,
                        path = %scope.path,
                        "Recursive schema reference, skipping"
                    );
                    return Ok(CompiledFields::default());
                }
                match self.cache.get(&name).await? {
                    Some(definition) => {
                        let scope = scope.enter(&name);
                        let Some(memo) = &session.memo else {
                            return self.compile_schema(definition, scope, session).await;
                        };
                        let key = scope.memo_key();
                        memo.get_or_try_load(key, || {
                            self.compile_schema(definition, scope, session)
                        })
                        .await
                    }
                    None => {
                        warn!(schema = %name, path = %scope.path, "Unresolvable schema reference");
                        Ok(CompiledFields::default())
                    }
                }
            }
            SchemaTarget::Inline(definition) => {
                self.compile_schema(Arc::new(definition), scope.clone(), session)
                    .await
            }
        }
    }

    async fn customize(
        &self,
        field: FieldConfig,
        property: &PropertySchema,
        definition: &SchemaDefinition,
        path: &str,
        session: &Session<'_>,
    ) -> CompileResult<Vec<FieldConfig>> {
        let Some(customizer) = session.options.customizer() else {
            return Ok(vec![field]);
        };

        let ctx = CustomizeContext {
            field: &field,
            property,
            schema: definition,
            path,
            options: session.options,
        };
        let decision = customizer
            .customize(ctx)
            .await
            .map_err(|e| CompileError::customizer(path, e))?;

        Ok(decision.into_fields(field))
    }

    async fn customize_root(
        &self,
        root: FieldConfig,
        definition: &SchemaDefinition,
        session: &Session<'_>,
    ) -> CompileResult<FieldConfig> {
        let Some(customizer) = session.options.customizer() else {
            return Ok(root);
        };

        let property = PropertySchema::new(ROOT_KEY)
            .with_type("object")
            .with_ref(format!("#/{}", definition.name));
        let ctx = CustomizeContext {
            field: &root,
            property: &property,
            schema: definition,
            path: "",
            options: session.options,
        };
        let decision = customizer
            .customize(ctx)
            .await
            .map_err(|e| CompileError::customizer(ROOT_KEY, e))?;

        match decision {
            Customized::Unchanged => Ok(root),
            Customized::Replace(replacement) => Ok(replacement),
            Customized::Expand(fields) => {
                let produced = fields.len();
                match fields.into_iter().find(|f| f.key == ROOT_KEY) {
                    Some(replacement) => {
                        if produced > 1 {
                            debug!(
                                discarded = produced - 1,
                                "Root customizer produced extra fields"
                            );
                        }
                        Ok(replacement)
                    }
                    None => {
                        warn!(
                            produced,
                            "Root customizer produced no `root` field, keeping default"
                        );
                        Ok(root)
                    }
                }
            }
        }
    }

    /// Wrap compiled fields into a group with its field-set layout.
    fn group(&self, key: &str, compiled: CompiledFields) -> FieldConfig {
        let field_sets = accumulate(
            &compiled.fields,
            &compiled.assignments,
            &self.config.root_field_set,
        );
        let mut group = FieldConfig::group(key, compiled.fields);
        group.field_sets = field_sets;
        group
    }

    fn prepend_identity_fields(&self, root: &mut FieldConfig) {
        if root.field_group.is_empty() {
            return;
        }
        let identity: Vec<FieldConfig> = self
            .config
            .identity_fields
            .iter()
            .filter(|key| root.child(key).is_none())
            .map(|key| FieldConfig::hidden_input(key.as_str()))
            .collect();
        root.field_group.splice(0..0, identity);
    }

    fn props_for(
        &self,
        kind: FieldKind,
        property: &PropertySchema,
        required: bool,
        prefix: Option<&str>,
    ) -> FieldProps {
        let mut props = FieldProps {
            label: Some(label_key(property, prefix)),
            placeholder: property.placeholder.clone(),
            description: property.description.clone(),
            classes: property.classes.clone(),
            required,
            hidden: property.hidden,
            disabled: property.disabled,
            readonly: property.read_only,
            extra: property.extensions.clone(),
            ..FieldProps::default()
        };

        match kind {
            FieldKind::Input => self.input_props(&mut props, property),
            FieldKind::Textarea => length_props(&mut props, property),
            FieldKind::Date => props.input_type = input_type(kind, property),
            FieldKind::Select | FieldKind::Radio => choice_props(&mut props, property, prefix),
            FieldKind::Upload => props.multiple = property.is_type("array"),
            FieldKind::Checkbox | FieldKind::Group | FieldKind::Array => {}
        }
        props
    }

    fn input_props(&self, props: &mut FieldProps, property: &PropertySchema) {
        props.input_type = input_type(FieldKind::Input, property);
        props.multiple = property.is_type("array");
        if props.input_type == Some(InputType::Number) {
            let (min, max) = numeric_bounds(property, self.config.numeric_bound);
            props.min = Some(min);
            props.max = Some(max);
            props.step = Some(step(property, self.config.default_step));
        } else {
            length_props(props, property);
            props.pattern = property.pattern.clone().filter(|p| !p.is_empty());
        }
    }
}

fn length_props(props: &mut FieldProps, property: &PropertySchema) {
    props.min_length = property.min_length.filter(|n| !n.is_nan());
    props.max_length = property.max_length.filter(|n| !n.is_nan());
}

fn choice_props(props: &mut FieldProps, property: &PropertySchema, prefix: Option<&str>) {
    props.multiple = property.is_type("array");
    props.options = if let Some(values) = property.effective_enum() {
        Some(OptionSource::Static(
            values
                .iter()
                .map(|value| {
                    SelectOption::new(value.clone(), option_label_key(property, value, prefix))
                })
                .collect(),
        ))
    } else if let Some(path) = property.options_path() {
        Some(OptionSource::Path(path.to_string()))
    } else {
        property
            .endpoint()
            .map(|endpoint| OptionSource::Endpoint(endpoint.to_string()))
    };
}

/// Label for a property: its explicit label or title, else its id
/// qualified by the prefix.
pub fn label_key(property: &PropertySchema, prefix: Option<&str>) -> String {
    if let Some(label) = property.display_label() {
        return label.to_string();
    }
    match prefix {
        Some(prefix) => format!("{prefix}.{}", property.id),
        None => property.id.to_string(),
    }
}

/// Label key of one enum option: `<prefix>.<property>.<value>`.
pub fn option_label_key(property: &PropertySchema, value: &Value, prefix: Option<&str>) -> String {
    let value = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match prefix {
        Some(prefix) => format!("{prefix}.{}.{value}", property.id),
        None => format!("{}.{value}", property.id),
    }
}
