//! AST node kinds and the tree-walking executor.
//!
//! The parser builds these nodes once; evaluation walks them directly
//! against a [`Scope`] and a [`Context`] carrying the output stream.
//! `return` is signalled through the reserved scope key
//! [`scope::RETURN_VALUE`]: `Return` plants it, every enclosing `Compound`
//! stops on it, and the nearest `MethodBody` extracts it.

use std::rc::Rc;

use crate::runtime::class::{Class, Instance};
use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;
use crate::runtime::ops;
use crate::runtime::scope::{self, Scope};
use crate::runtime::value::{InstanceRef, Value};

const INIT_METHOD: &str = "__init__";
const STR_METHOD: &str = "__str__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    NotEq,
    Less,
    Greater,
    LessOrEq,
    GreaterOrEq,
}

/// A node of the syntax tree. Statement and expression forms share one type;
/// every node evaluates to a [`Value`], with plain statements yielding
/// `None`.
#[derive(Debug)]
pub enum Statement {
    /// Literal value.
    Constant(Value),
    /// Binds `var` in the current scope and yields the bound value.
    Assignment { var: String, rv: Box<Statement> },
    /// Dotted identifier chain: a scope lookup followed by field reads.
    VariableValue { dotted_ids: Vec<String> },
    /// Renders its arguments space-separated to the context's output
    /// stream, followed by a newline.
    Print { args: Vec<Statement> },
    MethodCall {
        object: Box<Statement>,
        method: String,
        args: Vec<Statement>,
    },
    NewInstance {
        class: Rc<Class>,
        args: Vec<Statement>,
    },
    /// String coercion, the `str(...)` form.
    Stringify { arg: Box<Statement> },
    Arithmetic {
        op: ArithmeticOp,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Comparison {
        cmp: Comparator,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Or {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    And {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Not { arg: Box<Statement> },
    Compound { statements: Vec<Statement> },
    Return { rv: Box<Statement> },
    /// Binds the class under its own name in the current scope.
    ClassDefinition { class: Rc<Class> },
    FieldAssignment {
        object: Vec<String>,
        field: String,
        rv: Box<Statement>,
    },
    IfElse {
        condition: Box<Statement>,
        if_body: Box<Statement>,
        else_body: Option<Box<Statement>>,
    },
    /// Wraps a method body and turns the `return_val` sentinel into the
    /// call's result.
    MethodBody { body: Box<Statement> },
}

impl Statement {
    pub fn execute(&self, scope: &mut Scope, ctx: &mut Context) -> Result<Value, RuntimeError> {
        match self {
            Statement::Constant(value) => Ok(value.clone()),

            Statement::Assignment { var, rv } => {
                let value = rv.execute(scope, ctx)?;
                scope.set(var.clone(), value.clone());
                Ok(value)
            }

            Statement::VariableValue { dotted_ids } => resolve_path(dotted_ids, scope),

            Statement::Print { args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.execute(scope, ctx)?);
                }
                let mut line = String::new();
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        line.push(' ');
                    }
                    value.print(&mut line, ctx)?;
                }
                line.push('\n');
                ctx.output_stream().push_str(&line);
                Ok(Value::None)
            }

            Statement::MethodCall {
                object,
                method,
                args,
            } => {
                let receiver = object.execute(scope, ctx)?;
                let Value::Instance(handle) = receiver else {
                    return Err(RuntimeError::CallOnNonInstance {
                        method: method.clone(),
                        type_name: receiver.type_name(),
                    });
                };
                let mut actual_args = Vec::with_capacity(args.len());
                for arg in args {
                    actual_args.push(arg.execute(scope, ctx)?);
                }
                handle.call(method, actual_args, ctx)
            }

            Statement::NewInstance { class, args } => {
                let handle = InstanceRef::Owned(Instance::new(Rc::clone(class)));
                // Without a matching-arity __init__ the instance is returned
                // as-is and the arguments are not even evaluated.
                if !class.has_method(INIT_METHOD, args.len()) {
                    return Ok(Value::Instance(handle));
                }
                let mut actual_args = Vec::with_capacity(args.len());
                for arg in args {
                    actual_args.push(arg.execute(scope, ctx)?);
                }
                match handle.call(INIT_METHOD, actual_args, ctx)? {
                    Value::None => Ok(Value::Instance(handle)),
                    replacement => Ok(replacement),
                }
            }

            Statement::Stringify { arg } => {
                let value = arg.execute(scope, ctx)?;
                let mut rendered = String::new();
                match &value {
                    Value::Instance(handle) if handle.has_method(STR_METHOD, 0) => {
                        handle.call(STR_METHOD, vec![], ctx)?.print(&mut rendered, ctx)?;
                    }
                    other => other.print(&mut rendered, ctx)?,
                }
                Ok(Value::String(rendered))
            }

            Statement::Arithmetic { op, lhs, rhs } => {
                let lhs = lhs.execute(scope, ctx)?;
                let rhs = rhs.execute(scope, ctx)?;
                match op {
                    ArithmeticOp::Add => ops::add(&lhs, &rhs, ctx),
                    ArithmeticOp::Sub => ops::sub(&lhs, &rhs),
                    ArithmeticOp::Mul => ops::mul(&lhs, &rhs),
                    ArithmeticOp::Div => ops::div(&lhs, &rhs),
                }
            }

            Statement::Comparison { cmp, lhs, rhs } => {
                let lhs = lhs.execute(scope, ctx)?;
                let rhs = rhs.execute(scope, ctx)?;
                let result = match cmp {
                    Comparator::Eq => ops::equal(&lhs, &rhs, ctx)?,
                    Comparator::NotEq => ops::not_equal(&lhs, &rhs, ctx)?,
                    Comparator::Less => ops::less(&lhs, &rhs, ctx)?,
                    Comparator::Greater => ops::greater(&lhs, &rhs, ctx)?,
                    Comparator::LessOrEq => ops::less_or_equal(&lhs, &rhs, ctx)?,
                    Comparator::GreaterOrEq => ops::greater_or_equal(&lhs, &rhs, ctx)?,
                };
                Ok(Value::Bool(result))
            }

            Statement::Or { lhs, rhs } => {
                if lhs.execute(scope, ctx)?.is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    Ok(Value::Bool(rhs.execute(scope, ctx)?.is_truthy()))
                }
            }

            Statement::And { lhs, rhs } => {
                if lhs.execute(scope, ctx)?.is_truthy() {
                    Ok(Value::Bool(rhs.execute(scope, ctx)?.is_truthy()))
                } else {
                    Ok(Value::Bool(false))
                }
            }

            Statement::Not { arg } => Ok(Value::Bool(!arg.execute(scope, ctx)?.is_truthy())),

            Statement::Compound { statements } => {
                for statement in statements {
                    statement.execute(scope, ctx)?;
                    // A pending return aborts the rest of the sequence.
                    if scope.contains(scope::RETURN_VALUE) {
                        break;
                    }
                }
                Ok(Value::None)
            }

            Statement::Return { rv } => {
                let value = rv.execute(scope, ctx)?;
                scope.set(scope::RETURN_VALUE, value);
                Ok(Value::None)
            }

            Statement::ClassDefinition { class } => {
                scope.set(class.name().to_string(), Value::Class(Rc::clone(class)));
                Ok(Value::None)
            }

            Statement::FieldAssignment { object, field, rv } => {
                let receiver = resolve_path(object, scope)?;
                let Value::Instance(handle) = receiver else {
                    return Err(RuntimeError::FieldAccessOnNonInstance {
                        field: field.clone(),
                        type_name: receiver.type_name(),
                    });
                };
                let value = rv.execute(scope, ctx)?;
                let instance = handle.strong();
                instance.borrow_mut().fields_mut().set(field.clone(), value.clone());
                Ok(value)
            }

            Statement::IfElse {
                condition,
                if_body,
                else_body,
            } => {
                if condition.execute(scope, ctx)?.is_truthy() {
                    if_body.execute(scope, ctx)?;
                } else if let Some(else_body) = else_body {
                    else_body.execute(scope, ctx)?;
                }
                Ok(Value::None)
            }

            Statement::MethodBody { body } => {
                body.execute(scope, ctx)?;
                if scope.contains(scope::RETURN_VALUE) {
                    return scope.get(scope::RETURN_VALUE);
                }
                Ok(Value::None)
            }
        }
    }
}

/// Walks a dotted identifier chain: the first component is a scope key,
/// every further component a field read on a class instance. A missing
/// field reads as `None`; a missing variable is an error.
fn resolve_path(dotted_ids: &[String], scope: &Scope) -> Result<Value, RuntimeError> {
    let mut value = scope.get(&dotted_ids[0])?;
    for field in &dotted_ids[1..] {
        value = match value {
            Value::Instance(handle) => {
                let instance = handle.strong();
                let field_value = instance.borrow().fields().try_get(field);
                field_value.unwrap_or(Value::None)
            }
            other => {
                return Err(RuntimeError::FieldAccessOnNonInstance {
                    field: field.clone(),
                    type_name: other.type_name(),
                });
            }
        };
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::class::Method;

    fn constant(value: Value) -> Box<Statement> {
        Box::new(Statement::Constant(value))
    }

    fn number(n: i64) -> Box<Statement> {
        constant(Value::Number(n))
    }

    fn variable(name: &str) -> Box<Statement> {
        Box::new(Statement::VariableValue {
            dotted_ids: vec![name.to_string()],
        })
    }

    fn arithmetic(op: ArithmeticOp, lhs: Box<Statement>, rhs: Box<Statement>) -> Box<Statement> {
        Box::new(Statement::Arithmetic { op, lhs, rhs })
    }

    fn division_by_zero() -> Box<Statement> {
        arithmetic(ArithmeticOp::Div, number(1), number(0))
    }

    fn run(statement: &Statement) -> (Value, String) {
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        let value = statement.execute(&mut scope, &mut ctx).expect("execute should succeed");
        (value, ctx.into_output())
    }

    #[test]
    fn assignment_binds_and_yields_the_value() {
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        let statement = Statement::Assignment {
            var: "x".to_string(),
            rv: arithmetic(ArithmeticOp::Add, number(2), number(3)),
        };
        let value = statement.execute(&mut scope, &mut ctx).expect("execute should succeed");
        assert_eq!(value, Value::Number(5));
        assert_eq!(scope.get("x").expect("x is bound"), Value::Number(5));
    }

    #[test]
    fn print_renders_arguments_space_separated() {
        let statement = Statement::Print {
            args: vec![
                Statement::Constant(Value::Bool(true)),
                Statement::Constant(Value::String("hello".to_string())),
                Statement::Constant(Value::None),
                Statement::Constant(Value::Number(7)),
            ],
        };
        let (value, output) = run(&statement);
        assert_eq!(value, Value::None);
        assert_eq!(output, "True hello None 7\n");
    }

    #[test]
    fn print_without_arguments_emits_a_bare_newline() {
        let (_, output) = run(&Statement::Print { args: vec![] });
        assert_eq!(output, "\n");
    }

    #[test]
    fn arithmetic_nodes_nest() {
        // 2 + 3 * 4
        let expr = arithmetic(
            ArithmeticOp::Add,
            number(2),
            arithmetic(ArithmeticOp::Mul, number(3), number(4)),
        );
        let (value, _) = run(&expr);
        assert_eq!(value, Value::Number(14));
    }

    #[test]
    fn division_by_zero_surfaces() {
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        let err = division_by_zero()
            .execute(&mut scope, &mut ctx)
            .expect_err("expected division failure");
        assert_eq!(err, RuntimeError::DivisionByZero);
    }

    #[test]
    fn or_short_circuits_on_a_truthy_left_operand() {
        let statement = Statement::Or {
            lhs: constant(Value::Bool(true)),
            rhs: division_by_zero(),
        };
        let (value, _) = run(&statement);
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn and_short_circuits_on_a_falsy_left_operand() {
        let statement = Statement::And {
            lhs: constant(Value::Number(0)),
            rhs: division_by_zero(),
        };
        let (value, _) = run(&statement);
        assert_eq!(value, Value::Bool(false));
    }

    #[test]
    fn logical_operators_yield_booleans_for_any_operands() {
        let or = Statement::Or {
            lhs: constant(Value::Number(0)),
            rhs: constant(Value::String("x".to_string())),
        };
        assert_eq!(run(&or).0, Value::Bool(true));

        let and = Statement::And {
            lhs: constant(Value::Number(2)),
            rhs: constant(Value::String(String::new())),
        };
        assert_eq!(run(&and).0, Value::Bool(false));

        let not = Statement::Not {
            arg: constant(Value::None),
        };
        assert_eq!(run(&not).0, Value::Bool(true));
    }

    #[test]
    fn if_else_executes_exactly_one_branch() {
        let branch = |condition: Value| Statement::IfElse {
            condition: constant(condition),
            if_body: Box::new(Statement::Print {
                args: vec![Statement::Constant(Value::Number(1))],
            }),
            else_body: Some(Box::new(Statement::Print {
                args: vec![Statement::Constant(Value::Number(2))],
            })),
        };
        assert_eq!(run(&branch(Value::Number(1))).1, "1\n");
        assert_eq!(run(&branch(Value::Number(0))).1, "2\n");
    }

    #[test]
    fn if_without_else_is_a_no_op_on_a_falsy_condition() {
        let statement = Statement::IfElse {
            condition: constant(Value::Bool(false)),
            if_body: Box::new(Statement::Print {
                args: vec![Statement::Constant(Value::Number(1))],
            }),
            else_body: None,
        };
        assert_eq!(run(&statement).1, "");
    }

    #[test]
    fn return_aborts_nested_compounds_within_a_method_body() {
        // A return buried two compounds deep stops the outer sequence too.
        let body = Statement::MethodBody {
            body: Box::new(Statement::Compound {
                statements: vec![
                    Statement::Compound {
                        statements: vec![Statement::Return { rv: number(7) }],
                    },
                    Statement::Print {
                        args: vec![Statement::Constant(Value::String(
                            "unreachable".to_string(),
                        ))],
                    },
                ],
            }),
        };
        let (value, output) = run(&body);
        assert_eq!(value, Value::Number(7));
        assert_eq!(output, "");
    }

    #[test]
    fn method_body_without_return_yields_none() {
        let body = Statement::MethodBody {
            body: Box::new(Statement::Compound { statements: vec![] }),
        };
        assert_eq!(run(&body).0, Value::None);
    }

    #[test]
    fn return_value_does_not_cross_into_the_callers_scope() {
        let class = Class::new(
            "C",
            vec![Method {
                name: "f".to_string(),
                formal_params: vec![],
                body: Statement::MethodBody {
                    body: Box::new(Statement::Return { rv: number(1) }),
                },
            }],
            None,
        );
        let program = Statement::Compound {
            statements: vec![
                Statement::Assignment {
                    var: "c".to_string(),
                    rv: Box::new(Statement::NewInstance {
                        class,
                        args: vec![],
                    }),
                },
                Statement::Assignment {
                    var: "x".to_string(),
                    rv: Box::new(Statement::MethodCall {
                        object: variable("c"),
                        method: "f".to_string(),
                        args: vec![],
                    }),
                },
            ],
        };
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        program.execute(&mut scope, &mut ctx).expect("execute should succeed");
        assert_eq!(scope.get("x").expect("x is bound"), Value::Number(1));
        assert!(!scope.contains(scope::RETURN_VALUE));
    }

    #[test]
    fn class_definition_binds_the_class_by_name() {
        let class = Class::new("Point", vec![], None);
        let statement = Statement::ClassDefinition {
            class: Rc::clone(&class),
        };
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        statement.execute(&mut scope, &mut ctx).expect("execute should succeed");
        assert_eq!(scope.get("Point").expect("bound"), Value::Class(class));
    }

    #[test]
    fn field_assignment_writes_through_the_instance_handle() {
        let class = Class::new("Box", vec![], None);
        let program = Statement::Compound {
            statements: vec![
                Statement::Assignment {
                    var: "b".to_string(),
                    rv: Box::new(Statement::NewInstance {
                        class,
                        args: vec![],
                    }),
                },
                Statement::Assignment {
                    var: "alias".to_string(),
                    rv: variable("b"),
                },
                Statement::FieldAssignment {
                    object: vec!["b".to_string()],
                    field: "value".to_string(),
                    rv: number(9),
                },
                Statement::Print {
                    args: vec![Statement::VariableValue {
                        dotted_ids: vec!["alias".to_string(), "value".to_string()],
                    }],
                },
            ],
        };
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        program.execute(&mut scope, &mut ctx).expect("execute should succeed");
        assert_eq!(ctx.output(), "9\n");
    }

    #[test]
    fn missing_field_reads_as_none() {
        let class = Class::new("Box", vec![], None);
        let program = Statement::Compound {
            statements: vec![
                Statement::Assignment {
                    var: "b".to_string(),
                    rv: Box::new(Statement::NewInstance {
                        class,
                        args: vec![],
                    }),
                },
                Statement::Print {
                    args: vec![Statement::VariableValue {
                        dotted_ids: vec!["b".to_string(), "missing".to_string()],
                    }],
                },
            ],
        };
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        program.execute(&mut scope, &mut ctx).expect("execute should succeed");
        assert_eq!(ctx.output(), "None\n");
    }

    #[test]
    fn dotted_access_through_a_non_instance_is_a_type_error() {
        let statement = Statement::Compound {
            statements: vec![
                Statement::Assignment {
                    var: "n".to_string(),
                    rv: number(3),
                },
                Statement::Print {
                    args: vec![Statement::VariableValue {
                        dotted_ids: vec!["n".to_string(), "field".to_string()],
                    }],
                },
            ],
        };
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        let err = statement
            .execute(&mut scope, &mut ctx)
            .expect_err("expected a type error");
        assert_eq!(
            err,
            RuntimeError::FieldAccessOnNonInstance {
                field: "field".to_string(),
                type_name: "int"
            }
        );
    }

    #[test]
    fn undefined_variable_is_a_name_error() {
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        let err = variable("ghost")
            .execute(&mut scope, &mut ctx)
            .expect_err("expected a name error");
        assert_eq!(
            err,
            RuntimeError::UndefinedVariable {
                name: "ghost".to_string()
            }
        );
    }

    #[test]
    fn method_call_on_a_non_instance_is_a_call_error() {
        let statement = Statement::MethodCall {
            object: number(1),
            method: "f".to_string(),
            args: vec![],
        };
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        let err = statement
            .execute(&mut scope, &mut ctx)
            .expect_err("expected a call error");
        assert_eq!(
            err,
            RuntimeError::CallOnNonInstance {
                method: "f".to_string(),
                type_name: "int"
            }
        );
    }

    #[test]
    fn new_instance_ignores_arguments_without_a_matching_init() {
        // The argument would divide by zero if it were evaluated.
        let class = Class::new("C", vec![], None);
        let statement = Statement::NewInstance {
            class,
            args: vec![*division_by_zero()],
        };
        let (value, _) = run(&statement);
        assert!(matches!(value, Value::Instance(_)));
    }

    #[test]
    fn init_stores_constructor_arguments_as_fields() {
        let class = Class::new(
            "Box",
            vec![Method {
                name: "__init__".to_string(),
                formal_params: vec!["v".to_string()],
                body: Statement::MethodBody {
                    body: Box::new(Statement::FieldAssignment {
                        object: vec!["self".to_string()],
                        field: "v".to_string(),
                        rv: variable("v"),
                    }),
                },
            }],
            None,
        );
        let program = Statement::Compound {
            statements: vec![
                Statement::Assignment {
                    var: "b".to_string(),
                    rv: Box::new(Statement::NewInstance {
                        class,
                        args: vec![Statement::Constant(Value::Number(7))],
                    }),
                },
                Statement::Print {
                    args: vec![Statement::VariableValue {
                        dotted_ids: vec!["b".to_string(), "v".to_string()],
                    }],
                },
            ],
        };
        let mut scope = Scope::new();
        let mut ctx = Context::new();
        program.execute(&mut scope, &mut ctx).expect("execute should succeed");
        assert_eq!(ctx.output(), "7\n");
    }

    #[test]
    fn init_returning_a_value_replaces_the_instance() {
        let class = Class::new(
            "Odd",
            vec![Method {
                name: "__init__".to_string(),
                formal_params: vec![],
                body: Statement::MethodBody {
                    body: Box::new(Statement::Return { rv: number(5) }),
                },
            }],
            None,
        );
        let statement = Statement::NewInstance {
            class,
            args: vec![],
        };
        assert_eq!(run(&statement).0, Value::Number(5));
    }

    #[test]
    fn stringify_coerces_values_to_strings() {
        assert_eq!(
            run(&Statement::Stringify { arg: constant(Value::None) }).0,
            Value::String("None".to_string())
        );
        assert_eq!(
            run(&Statement::Stringify { arg: number(12) }).0,
            Value::String("12".to_string())
        );
        assert_eq!(
            run(&Statement::Stringify {
                arg: constant(Value::Bool(false))
            })
            .0,
            Value::String("False".to_string())
        );
    }

    #[test]
    fn stringify_uses_a_zero_arity_str_method() {
        let class = Class::new(
            "Named",
            vec![Method {
                name: "__str__".to_string(),
                formal_params: vec![],
                body: Statement::MethodBody {
                    body: Box::new(Statement::Return {
                        rv: constant(Value::String("named".to_string())),
                    }),
                },
            }],
            None,
        );
        let statement = Statement::Stringify {
            arg: Box::new(Statement::NewInstance {
                class,
                args: vec![],
            }),
        };
        assert_eq!(run(&statement).0, Value::String("named".to_string()));
    }

    #[test]
    fn comparison_nodes_wrap_the_kernel() {
        let cmp = |cmp, l, r| Statement::Comparison {
            cmp,
            lhs: number(l),
            rhs: number(r),
        };
        assert_eq!(run(&cmp(Comparator::Eq, 2, 2)).0, Value::Bool(true));
        assert_eq!(run(&cmp(Comparator::NotEq, 2, 2)).0, Value::Bool(false));
        assert_eq!(run(&cmp(Comparator::Less, 1, 2)).0, Value::Bool(true));
        assert_eq!(run(&cmp(Comparator::Greater, 1, 2)).0, Value::Bool(false));
        assert_eq!(run(&cmp(Comparator::LessOrEq, 2, 2)).0, Value::Bool(true));
        assert_eq!(run(&cmp(Comparator::GreaterOrEq, 1, 2)).0, Value::Bool(false));
    }
}
