//! Template-driven command-line argument parsing and usage rendering.
//!
//! The help text is the single source of truth: a usage template is compiled
//! into a [`template::Grammar`], argv is matched against it, and the same
//! template renders as the help screen. A template looks like:
//!
//! ```text
//! Usage: {{COMMAND}} {{OPTION}} <SRC> [DEST]...
//!
//! Copy files between hosts.
//!
//! + -m, --mode     ## transfer mode
//! * -n, --count    ## number of attempts (required)
//! ? -q, --quiet    ## suppress progress output
//! ```
//!
//! `<NAME>` declares a required operand, `[NAME]` an optional one, and a
//! trailing `...` marks the operand that collects the remaining values.
//! Option lines start with a sigil: `+` takes a value, `*` takes a value and
//! must appear, `?` is a switch. Everything else is free text and is kept for
//! rendering.

pub mod template {
    use std::sync::LazyLock;

    use indexmap::{IndexMap, IndexSet};
    use regex::Regex;
    use serde::Serialize;
    use thiserror::Error;

    /// Errors produced while compiling a usage template.
    ///
    /// Line numbers are 1-based over physical lines, blank lines included.
    #[derive(Debug, Clone, Error)]
    pub enum CompileError {
        #[error("required operand '{required}' at the right of '{optional}' in line {line}")]
        RequiredAfterOptional {
            required: String,
            optional: String,
            line: usize,
        },
        #[error("only one list operand allowed in usage line {line}")]
        ListOperandConflict { name: String, line: usize },
        #[error("list operand '{name}' must be last in usage line {line}")]
        ListOperandNotLast { name: String, line: usize },
        #[error("invalid operand name '{name}' in line {line}")]
        InvalidOperandName { name: String, line: usize },
        #[error("incorrect option line {line}: '{text}'")]
        MalformedOptionLine { line: usize, text: String },
    }

    impl CompileError {
        /// The template line the error was raised on.
        pub fn line(&self) -> usize {
            match self {
                Self::RequiredAfterOptional { line, .. }
                | Self::ListOperandConflict { line, .. }
                | Self::ListOperandNotLast { line, .. }
                | Self::InvalidOperandName { line, .. }
                | Self::MalformedOptionLine { line, .. } => *line,
            }
        }
    }

    struct TemplatePatterns {
        operand_name: Regex,
        required_operand: Regex,
        optional_operand: Regex,
        option_line: Regex,
    }

    impl TemplatePatterns {
        fn new() -> Self {
            // The ellipsis alternatives come first so `<X>...` wins over `<X>`
            // at the same start position.
            Self {
                operand_name: Regex::new(r"^[a-zA-Z]+[a-zA-Z0-9_-]*$")
                    .expect("static regex must compile"),
                required_operand: Regex::new(r"<[^<>]+>\.\.\.|<[^<>]+>")
                    .expect("static regex must compile"),
                optional_operand: Regex::new(r"\[[^\[\]]+\]\.\.\.|\[[^\[\]]+\]")
                    .expect("static regex must compile"),
                option_line: Regex::new(
                    r"^[+*?]( *-{1,2}[a-zA-Z]+[a-zA-Z0-9_-]*)(, *-{1,2}[a-zA-Z]+[a-zA-Z0-9_-]*)?( *#+.*)?$",
                )
                .expect("static regex must compile"),
            }
        }
    }

    static PATTERNS: LazyLock<TemplatePatterns> = LazyLock::new(TemplatePatterns::new);

    /// A compiled usage template.
    ///
    /// Immutable once compiled. Serializes to JSON with kebab-case keys for
    /// inspection; the template text itself is not part of the serialized
    /// form.
    #[derive(Debug, Clone, Default, Serialize)]
    #[serde(rename_all = "kebab-case")]
    pub struct Grammar {
        #[serde(skip)]
        template: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        operand_names: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        required_operands: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        array_operand: Option<String>,
        #[serde(skip_serializing_if = "IndexSet::is_empty")]
        options: IndexSet<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        required_options: Vec<String>,
        #[serde(skip_serializing_if = "IndexSet::is_empty")]
        switches: IndexSet<String>,
        #[serde(skip_serializing_if = "IndexMap::is_empty")]
        aliases: IndexMap<String, String>,
    }

    impl Grammar {
        /// Compile template text into a grammar.
        ///
        /// Lines are examined one by one:
        /// - a line starting with `Usage:` declares operands via `<NAME>`,
        ///   `[NAME]` and the trailing `...` list marker;
        /// - a line starting with `+`, `*` or `?` declares an option, with an
        ///   optional comma-separated alias and a `#`-delimited description;
        /// - anything else is free text, kept only for [`Grammar::usage`].
        ///
        /// Compilation stops at the first violation: required operands right
        /// of optional ones, more than one list operand, a list operand that
        /// is not last, an operand name that is not an identifier, or an
        /// option line that does not match the option shape.
        pub fn compile(template: &str) -> Result<Self, CompileError> {
            let mut grammar = Grammar {
                template: template.to_string(),
                ..Default::default()
            };
            for (index, raw) in template.split('\n').enumerate() {
                let li = index + 1;
                let line = raw.trim();
                if line.is_empty() {
                    continue;
                }
                if line.starts_with("Usage:") {
                    grammar.compile_usage_line(li, line)?;
                    continue;
                }
                let sigil = line.chars().next().unwrap_or_default();
                if !"+*?".contains(sigil) {
                    continue;
                }
                grammar.compile_option_line(li, line, sigil)?;
            }
            Ok(grammar)
        }

        fn compile_usage_line(&mut self, li: usize, line: &str) -> Result<(), CompileError> {
            let required: Vec<regex::Match<'_>> =
                PATTERNS.required_operand.find_iter(line).collect();
            let optional: Vec<regex::Match<'_>> =
                PATTERNS.optional_operand.find_iter(line).collect();

            if let Some(first_optional) = optional.first() {
                for token in &required {
                    if token.start() > first_optional.start() {
                        return Err(CompileError::RequiredAfterOptional {
                            required: token.as_str().to_string(),
                            optional: first_optional.as_str().to_string(),
                            line: li,
                        });
                    }
                }
            }

            for token in &required {
                let name = self.register_operand(li, token.as_str())?;
                self.required_operands.push(name);
            }
            for token in &optional {
                self.register_operand(li, token.as_str())?;
            }

            if let Some(array) = self.array_operand.clone() {
                let position = self.operand_names.iter().position(|name| *name == array);
                if position != Some(self.operand_names.len() - 1) {
                    return Err(CompileError::ListOperandNotLast {
                        name: array,
                        line: li,
                    });
                }
            }
            Ok(())
        }

        fn register_operand(&mut self, li: usize, token: &str) -> Result<String, CompileError> {
            let name = operand_token_name(token);
            if token.contains("...") {
                if self.array_operand.is_some() {
                    return Err(CompileError::ListOperandConflict {
                        name: name.to_string(),
                        line: li,
                    });
                }
                self.array_operand = Some(name.to_string());
            }
            if !PATTERNS.operand_name.is_match(name) {
                return Err(CompileError::InvalidOperandName {
                    name: name.to_string(),
                    line: li,
                });
            }
            self.operand_names.push(name.to_string());
            Ok(name.to_string())
        }

        fn compile_option_line(
            &mut self,
            li: usize,
            line: &str,
            sigil: char,
        ) -> Result<(), CompileError> {
            let caps = PATTERNS.option_line.captures(line).ok_or_else(|| {
                CompileError::MalformedOptionLine {
                    line: li,
                    text: line.to_string(),
                }
            })?;
            let option = caps[1].trim().to_string();
            let alias = caps
                .get(2)
                .map(|m| m.as_str().trim_start_matches(',').trim().to_string());

            self.options.insert(option.clone());
            match sigil {
                '*' => self.required_options.push(option.clone()),
                '?' => {
                    self.switches.insert(option.clone());
                }
                _ => {}
            }
            if let Some(alias) = alias {
                self.aliases.insert(option.clone(), alias.clone());
                self.aliases.insert(alias, option);
            }
            Ok(())
        }

        /// The original template text.
        pub fn template(&self) -> &str {
            &self.template
        }

        /// Declared operand names, required ones first.
        pub fn operand_names(&self) -> &[String] {
            &self.operand_names
        }

        /// Required operand names, in usage-line order.
        pub fn required_operands(&self) -> &[String] {
            &self.required_operands
        }

        /// The operand carrying the `...` marker, if any.
        pub fn array_operand(&self) -> Option<&str> {
            self.array_operand.as_deref()
        }

        /// Canonical option names, in declaration order.
        pub fn options(&self) -> &IndexSet<String> {
            &self.options
        }

        /// Canonical names of `*` options.
        pub fn required_options(&self) -> &[String] {
            &self.required_options
        }

        /// Canonical names of `?` options.
        pub fn switches(&self) -> &IndexSet<String> {
            &self.switches
        }

        /// The alias map; both directions are present.
        pub fn aliases(&self) -> &IndexMap<String, String> {
            &self.aliases
        }

        /// The other spelling of an option, if one was declared.
        pub fn alias_of(&self, name: &str) -> Option<&str> {
            self.aliases.get(name).map(String::as_str)
        }

        /// Whether `name`, under either spelling, is a declared option.
        pub fn knows_option(&self, name: &str) -> bool {
            self.options.contains(name) || self.aliases.contains_key(name)
        }

        /// Whether `name`, under either spelling, is a declared switch.
        pub fn is_switch(&self, name: &str) -> bool {
            self.switches.contains(name)
                || self
                    .alias_of(name)
                    .is_some_and(|alias| self.switches.contains(alias))
        }

        /// Position of a declared operand name.
        pub fn operand_index(&self, name: &str) -> Option<usize> {
            self.operand_names.iter().position(|n| n == name)
        }

        /// Render the template as help text.
        ///
        /// `<` and `>` are stripped from usage lines, option sigils and the
        /// first `#` of a description are blanked, `{{COMMAND}}` becomes the
        /// basename of `command` and `{{OPTION}}` becomes `[OPTION]...`.
        pub fn usage(&self, command: &str) -> String {
            let cmd = command_basename(command);
            let mut text = String::new();
            for raw in self.template.trim().split('\n') {
                let line = raw.trim();
                if line.is_empty() {
                    text.push('\n');
                    continue;
                }
                let mut line = line.to_string();
                if line.contains("Usage:") {
                    line = line.replace('<', "").replace('>', "");
                }
                match line.chars().next() {
                    Some('+' | '*' | '?') => {
                        line.replace_range(..1, " ");
                        line = line.replacen('#', " ", 1);
                    }
                    Some('#') => line.replace_range(..1, " "),
                    _ => {}
                }
                line = line.replace("{{COMMAND}}", cmd);
                line = line.replace("{{OPTION}}", "[OPTION]...");
                text.push_str(&line);
                text.push('\n');
            }
            text
        }
    }

    fn operand_token_name(token: &str) -> &str {
        let inner = token.strip_suffix("...").unwrap_or(token);
        &inner[1..inner.len() - 1]
    }

    /// Basename of a command path, over both `/` and `\` separators.
    ///
    /// The shorter remainder wins, so mixed paths like `c:/dir\app.exe`
    /// still reduce to `app.exe`.
    fn command_basename(command: &str) -> &str {
        let mut cmd = command;
        if let Some((_, tail)) = command.rsplit_once('\\') {
            if !tail.is_empty() {
                cmd = tail;
            }
        }
        if let Some((_, tail)) = command.rsplit_once('/') {
            if !tail.is_empty() && tail.len() < cmd.len() {
                cmd = tail;
            }
        }
        cmd
    }
}

pub mod args {
    use indexmap::IndexMap;
    use thiserror::Error;

    use super::template::Grammar;

    /// Value recorded for a switch that appeared in argv.
    pub const SWITCH_ON: &str = "on";

    /// The exact literals bool coercion and [`Parsed::has`] treat as true.
    pub const TRUTHY_LITERALS: [&str; 3] = ["on", "yes", "true"];

    fn is_truthy(value: &str) -> bool {
        TRUTHY_LITERALS.contains(&value)
    }

    /// A token starting with `-` but not `--`. A bare `-` counts.
    fn is_short_ref(token: &str) -> bool {
        token.starts_with('-') && !token.starts_with("--")
    }

    /// A token starting with `--`. A bare `--` counts; there is no
    /// end-of-options separator convention.
    fn is_long_ref(token: &str) -> bool {
        token.starts_with("--")
    }

    /// Per-call parse behavior.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ParseOptions {
        /// Route unknown option-shaped tokens to the operand list instead of
        /// failing.
        pub allow_unknown: bool,
    }

    /// Errors produced while matching argv against a grammar or resolving
    /// bindings.
    #[derive(Debug, Clone, Error)]
    pub enum ParseError {
        #[error("invalid option '{0}'")]
        InvalidOption(String),
        #[error("unrecognized option '{0}'")]
        UnrecognizedOption(String),
        #[error("missing operand '{0}'")]
        MissingOperand(String),
        #[error("missing option '{0}'")]
        MissingOption(String),
        #[error("list operand '{0}' not found in usage")]
        NotListOperand(String),
        #[error("'{0}' is not a single operand in usage")]
        NotScalarOperand(String),
        #[error("invalid option '{name}', because {source}")]
        InvalidValue {
            name: String,
            #[source]
            source: CoerceError,
        },
    }

    /// The conversion failure behind [`ParseError::InvalidValue`].
    #[derive(Debug, Clone, Error)]
    pub enum CoerceError {
        #[error(transparent)]
        Int(#[from] std::num::ParseIntError),
        #[error(transparent)]
        Float(#[from] std::num::ParseFloatError),
    }

    /// The outcome of one parse call.
    ///
    /// Borrows the grammar for name resolution; values are owned copies of
    /// the argv tokens.
    #[derive(Debug, Clone)]
    pub struct Parsed<'g> {
        grammar: &'g Grammar,
        command: String,
        operands: Vec<String>,
        options: IndexMap<String, String>,
    }

    impl<'g> Parsed<'g> {
        /// The recorded `argv[0]`.
        pub fn command(&self) -> &str {
            &self.command
        }

        /// A single option value, under either spelling.
        pub fn option<'s>(&'s self, name: &str, default: &'s str) -> &'s str {
            if let Some(value) = self.options.get(name) {
                return value;
            }
            if let Some(alias) = self.grammar.alias_of(name) {
                if let Some(value) = self.options.get(alias) {
                    return value;
                }
            }
            default
        }

        /// Whether a switch is set.
        ///
        /// Returns `default` when `name` is not a declared switch or no value
        /// was recorded; otherwise whether the recorded value is one of
        /// [`TRUTHY_LITERALS`].
        pub fn has(&self, name: &str, default: bool) -> bool {
            if !self.grammar.is_switch(name) {
                return default;
            }
            let value = self.options.get(name).or_else(|| {
                self.grammar
                    .alias_of(name)
                    .and_then(|alias| self.options.get(alias))
            });
            match value {
                Some(value) => is_truthy(value),
                None => default,
            }
        }

        /// A scalar operand by declared name. The list operand always yields
        /// the default here; use [`Parsed::operand_list`] for it.
        pub fn operand<'s>(&'s self, name: &str, default: &'s str) -> &'s str {
            if self.grammar.array_operand() == Some(name) {
                return default;
            }
            let Some(index) = self.grammar.operand_index(name) else {
                return default;
            };
            self.operands.get(index).map(String::as_str).unwrap_or(default)
        }

        /// The list operand's collected tail, from its declared position to
        /// the end. Any other name yields the default.
        pub fn operand_list<'s>(&'s self, name: &str, default: &'s [String]) -> &'s [String] {
            if self.grammar.array_operand() != Some(name) {
                return default;
            }
            let Some(index) = self.grammar.operand_index(name) else {
                return default;
            };
            if index >= self.operands.len() {
                return default;
            }
            &self.operands[index..]
        }

        /// An operand value by collected position.
        pub fn operand_at<'s>(&'s self, index: usize, default: &'s str) -> &'s str {
            self.operands.get(index).map(String::as_str).unwrap_or(default)
        }

        /// All collected operand values, in order.
        pub fn operands(&self) -> &[String] {
            &self.operands
        }

        /// All recorded option values, keyed by the spelling used in argv,
        /// in first-use order.
        pub fn options(&self) -> &IndexMap<String, String> {
            &self.options
        }

        /// Render the grammar's template with this parse's command.
        pub fn usage(&self) -> String {
            self.grammar.usage(&self.command)
        }
    }

    /// Parse `argv` against a compiled grammar.
    ///
    /// `argv[0]` is recorded as the command and never interpreted as an
    /// operand or option. Short options take their value from the next
    /// token, long options only via `--name=value`; a long token without `=`
    /// is legal only as a switch. Each call produces a fresh [`Parsed`].
    pub fn parse<'g>(
        grammar: &'g Grammar,
        argv: &[String],
        options: ParseOptions,
    ) -> Result<Parsed<'g>, ParseError> {
        let mut command = String::new();
        let mut operands: Vec<String> = Vec::new();
        let mut values: IndexMap<String, String> = IndexMap::new();

        let mut i = 0usize;
        while i < argv.len() {
            let arg = argv[i].as_str();
            if i == 0 {
                command = arg.to_string();
                i += 1;
                continue;
            }

            if is_short_ref(arg) {
                if !grammar.knows_option(arg) {
                    if options.allow_unknown {
                        operands.push(arg.to_string());
                        i += 1;
                        continue;
                    }
                    return Err(ParseError::InvalidOption(arg.to_string()));
                }
                if grammar.is_switch(arg) {
                    values.insert(arg.to_string(), SWITCH_ON.to_string());
                    i += 1;
                    continue;
                }
                match argv.get(i + 1) {
                    Some(value) if !is_short_ref(value) && !is_long_ref(value) => {
                        values.insert(arg.to_string(), value.clone());
                        i += 2;
                        continue;
                    }
                    _ => return Err(ParseError::InvalidOption(arg.to_string())),
                }
            }

            if is_long_ref(arg) {
                let Some((name, value)) = arg.split_once('=') else {
                    // Bare long form. Only a switch is legal here.
                    if grammar.is_switch(arg) {
                        values.insert(arg.to_string(), SWITCH_ON.to_string());
                    } else if options.allow_unknown {
                        operands.push(arg.to_string());
                    } else {
                        return Err(ParseError::UnrecognizedOption(arg.to_string()));
                    }
                    i += 1;
                    continue;
                };
                if !grammar.knows_option(name) {
                    if options.allow_unknown {
                        operands.push(arg.to_string());
                        i += 1;
                        continue;
                    }
                    return Err(ParseError::InvalidOption(name.to_string()));
                }
                if value.is_empty() {
                    return Err(ParseError::UnrecognizedOption(name.to_string()));
                }
                values.insert(name.to_string(), value.to_string());
                i += 1;
                continue;
            }

            operands.push(arg.to_string());
            i += 1;
        }

        // The first unmet required operand sits at the number of
        // collected values.
        if grammar.required_operands().len() > operands.len() {
            return Err(ParseError::MissingOperand(
                grammar.required_operands()[operands.len()].clone(),
            ));
        }
        for name in grammar.required_options() {
            let provided = values.contains_key(name)
                || grammar
                    .alias_of(name)
                    .is_some_and(|alias| values.contains_key(alias));
            if !provided {
                return Err(ParseError::MissingOption(name.clone()));
            }
        }

        Ok(Parsed {
            grammar,
            command,
            operands,
            options: values,
        })
    }

    /// Name collection for argv membership tests.
    pub trait ArgNames<'a> {
        type Iter: Iterator<Item = &'a str>;
        fn iter(self) -> Self::Iter;
    }

    impl<'a> ArgNames<'a> for &'a str {
        type Iter = std::iter::Once<&'a str>;

        fn iter(self) -> Self::Iter {
            std::iter::once(self)
        }
    }

    impl<'a> ArgNames<'a> for &'a [&'a str] {
        type Iter = std::iter::Copied<std::slice::Iter<'a, &'a str>>;

        fn iter(self) -> Self::Iter {
            self.iter().copied()
        }
    }

    impl<'a, const N: usize> ArgNames<'a> for [&'a str; N] {
        type Iter = std::array::IntoIter<&'a str, N>;

        fn iter(self) -> Self::Iter {
            self.into_iter()
        }
    }

    /// Check whether any of `names` occurs literally in `argv`.
    ///
    /// Typically used to answer `-h`/`--help` or `--version` before
    /// compiling or parsing anything. Accepts a single name or multiple
    /// names via array/slice.
    pub fn has_args<'a, N>(argv: &[String], names: N) -> bool
    where
        N: ArgNames<'a>,
    {
        let names: Vec<&str> = names.iter().collect();
        argv.iter()
            .any(|arg| names.iter().any(|name| arg == name))
    }

    enum Binding<'v> {
        List {
            dest: &'v mut Vec<String>,
            default: Vec<String>,
        },
        Scalar(ScalarBinding<'v>),
    }

    enum ScalarBinding<'v> {
        Str {
            dest: &'v mut String,
            default: String,
        },
        Bool {
            dest: &'v mut bool,
            default: bool,
        },
        I32 {
            dest: &'v mut i32,
            default: i32,
        },
        I64 {
            dest: &'v mut i64,
            default: i64,
        },
        F32 {
            dest: &'v mut f32,
            default: f32,
        },
        F64 {
            dest: &'v mut f64,
            default: f64,
        },
    }

    impl<'v> ScalarBinding<'v> {
        /// An empty raw value always yields the registered default.
        fn assign(self, raw: &str) -> Result<(), CoerceError> {
            match self {
                Self::Str { dest, default } => {
                    *dest = if raw.is_empty() {
                        default
                    } else {
                        raw.to_string()
                    };
                }
                Self::Bool { dest, default } => {
                    *dest = if raw.is_empty() {
                        default
                    } else {
                        is_truthy(raw)
                    };
                }
                Self::I32 { dest, default } => {
                    *dest = if raw.is_empty() { default } else { raw.parse()? };
                }
                Self::I64 { dest, default } => {
                    *dest = if raw.is_empty() { default } else { raw.parse()? };
                }
                Self::F32 { dest, default } => {
                    *dest = if raw.is_empty() { default } else { raw.parse()? };
                }
                Self::F64 { dest, default } => {
                    *dest = if raw.is_empty() { default } else { raw.parse()? };
                }
            }
            Ok(())
        }
    }

    /// Registers typed destinations against a grammar, then parses.
    ///
    /// Destinations are plain `&mut` slots. They are written when
    /// [`Binder::parse`] succeeds structurally, in registration order,
    /// operands before options. List bindings are only available for
    /// operands.
    pub struct Binder<'g, 'v> {
        grammar: &'g Grammar,
        operand_binds: Vec<(String, Binding<'v>)>,
        option_binds: Vec<(String, ScalarBinding<'v>)>,
    }

    impl<'g, 'v> Binder<'g, 'v> {
        pub fn new(grammar: &'g Grammar) -> Self {
            Self {
                grammar,
                operand_binds: Vec::new(),
                option_binds: Vec::new(),
            }
        }

        pub fn string_operand(
            &mut self,
            name: impl Into<String>,
            dest: &'v mut String,
            default: impl Into<String>,
        ) {
            self.operand_binds.push((
                name.into(),
                Binding::Scalar(ScalarBinding::Str {
                    dest,
                    default: default.into(),
                }),
            ));
        }

        /// Bind the list operand's collected tail.
        pub fn strings_operand(
            &mut self,
            name: impl Into<String>,
            dest: &'v mut Vec<String>,
            default: Vec<String>,
        ) {
            self.operand_binds
                .push((name.into(), Binding::List { dest, default }));
        }

        pub fn bool_operand(&mut self, name: impl Into<String>, dest: &'v mut bool, default: bool) {
            self.operand_binds.push((
                name.into(),
                Binding::Scalar(ScalarBinding::Bool { dest, default }),
            ));
        }

        pub fn i32_operand(&mut self, name: impl Into<String>, dest: &'v mut i32, default: i32) {
            self.operand_binds.push((
                name.into(),
                Binding::Scalar(ScalarBinding::I32 { dest, default }),
            ));
        }

        pub fn i64_operand(&mut self, name: impl Into<String>, dest: &'v mut i64, default: i64) {
            self.operand_binds.push((
                name.into(),
                Binding::Scalar(ScalarBinding::I64 { dest, default }),
            ));
        }

        pub fn f32_operand(&mut self, name: impl Into<String>, dest: &'v mut f32, default: f32) {
            self.operand_binds.push((
                name.into(),
                Binding::Scalar(ScalarBinding::F32 { dest, default }),
            ));
        }

        pub fn f64_operand(&mut self, name: impl Into<String>, dest: &'v mut f64, default: f64) {
            self.operand_binds.push((
                name.into(),
                Binding::Scalar(ScalarBinding::F64 { dest, default }),
            ));
        }

        pub fn string_option(
            &mut self,
            name: impl Into<String>,
            dest: &'v mut String,
            default: impl Into<String>,
        ) {
            self.option_binds.push((
                name.into(),
                ScalarBinding::Str {
                    dest,
                    default: default.into(),
                },
            ));
        }

        pub fn bool_option(&mut self, name: impl Into<String>, dest: &'v mut bool, default: bool) {
            self.option_binds
                .push((name.into(), ScalarBinding::Bool { dest, default }));
        }

        pub fn i32_option(&mut self, name: impl Into<String>, dest: &'v mut i32, default: i32) {
            self.option_binds
                .push((name.into(), ScalarBinding::I32 { dest, default }));
        }

        pub fn i64_option(&mut self, name: impl Into<String>, dest: &'v mut i64, default: i64) {
            self.option_binds
                .push((name.into(), ScalarBinding::I64 { dest, default }));
        }

        pub fn f32_option(&mut self, name: impl Into<String>, dest: &'v mut f32, default: f32) {
            self.option_binds
                .push((name.into(), ScalarBinding::F32 { dest, default }));
        }

        pub fn f64_option(&mut self, name: impl Into<String>, dest: &'v mut f64, default: f64) {
            self.option_binds
                .push((name.into(), ScalarBinding::F64 { dest, default }));
        }

        /// Parse `argv`, resolve every registered binding and return the
        /// parse result.
        ///
        /// A coercion failure aborts resolution; destinations registered
        /// before the failing one keep the values already written.
        pub fn parse(
            self,
            argv: &[String],
            options: ParseOptions,
        ) -> Result<Parsed<'g>, ParseError> {
            let Binder {
                grammar,
                operand_binds,
                option_binds,
            } = self;
            let parsed = parse(grammar, argv, options)?;

            for (name, binding) in operand_binds {
                match binding {
                    Binding::List { dest, default } => {
                        if grammar.array_operand() != Some(name.as_str()) {
                            return Err(ParseError::NotListOperand(name));
                        }
                        let tail = parsed.operand_list(&name, &[]);
                        *dest = if tail.is_empty() {
                            default
                        } else {
                            tail.to_vec()
                        };
                    }
                    Binding::Scalar(binding) => {
                        if grammar.array_operand() == Some(name.as_str()) {
                            return Err(ParseError::NotScalarOperand(name));
                        }
                        let raw = parsed.operand(&name, "");
                        binding
                            .assign(raw)
                            .map_err(|source| ParseError::InvalidValue { name, source })?;
                    }
                }
            }

            for (name, binding) in option_binds {
                if !is_long_ref(&name) && !is_short_ref(&name) {
                    return Err(ParseError::InvalidOption(name));
                }
                let raw = parsed.option(&name, "");
                binding
                    .assign(raw)
                    .map_err(|source| ParseError::InvalidValue { name, source })?;
            }

            Ok(parsed)
        }
    }
}
