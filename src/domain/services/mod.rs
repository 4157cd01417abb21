mod overload_evaluator;

pub use overload_evaluator::OverloadEvaluator;
