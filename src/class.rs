//! Classes and their instances.
//!
//! A class is a factory (calling it constructs an instance) and also a
//! property holder for its static methods. An instance owns its fields and
//! one getter per declared getter, bound to itself when it is constructed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::Callable;
use crate::error::RuntimeError;
use crate::function::LoxFunction;
use crate::interpreter::{IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

const INITIALIZER: &str = "init";

pub struct LoxClass {
    pub name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    statics: HashMap<String, Rc<LoxFunction>>,
    getters: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: impl Into<String>,
        methods: HashMap<String, Rc<LoxFunction>>,
        statics: HashMap<String, Rc<LoxFunction>>,
        getters: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name: name.into(),
            methods,
            statics,
            getters,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<&Rc<LoxFunction>> {
        self.methods.get(name)
    }

    /// Property access on the class itself only sees statics.
    pub fn get_static(&self, name: &Token) -> Result<Value, RuntimeError> {
        self.statics
            .get(&name.lexeme)
            .map(|method| Value::Function(Rc::clone(method)))
            .ok_or_else(|| RuntimeError::UndefinedProperty {
                name: name.lexeme.clone(),
                line: name.line,
            })
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Callable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        site: &Token,
    ) -> IResult<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self))));
        let receiver = Value::Instance(Rc::clone(&instance));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            let bound = initializer.bind(receiver.clone());
            interpreter.invoke(&bound, arguments, site)?;
        }

        for (name, getter) in &self.getters {
            let bound = Rc::new(getter.bind(receiver.clone()));
            instance.borrow_mut().add_getter(name, bound);
        }

        Ok(receiver)
    }
}

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
    getters: HashMap<String, Rc<LoxFunction>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
            getters: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    pub fn add_getter(&mut self, name: &str, getter: Rc<LoxFunction>) {
        self.getters.insert(name.to_string(), getter);
    }

    /// Getter, then field, then method bound to `instance` on demand.
    ///
    /// A getter is returned as a value; invoking it is up to the caller.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value, RuntimeError> {
        let this = instance.borrow();

        if let Some(getter) = this.getters.get(&name.lexeme) {
            return Ok(Value::Function(Rc::clone(getter)));
        }

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            let bound = method.bind(Value::Instance(Rc::clone(instance)));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(RuntimeError::UndefinedProperty {
            name: name.lexeme.clone(),
            line: name.line,
        })
    }

    /// Always writes a field, even when it shadows a method name.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
